use crate::prelude::*;

/// A file descriptor we own. Closes itself on drop so no launch path can
/// leak a pipe end; a leaked write end would keep the reader from ever
/// seeing EOF.
#[derive(Debug)]
pub struct RustFd {
	fd: RawFd,
}

impl RustFd {
	/// Open a file using a file descriptor, with the given OFlags and Mode bits
	pub fn open(path: &Path, flags: OFlag, mode: Mode) -> ShResult<Self> {
		let fd = open(path, flags, mode)
			.map_err(|e| ShErr::Io(format!("{}: {}", path.display(), e)))?;
		Ok(Self { fd })
	}

	/// Wrapper for nix::unistd::pipe(), produces a read/write pair of `RustFd`s
	pub fn pipe() -> ShResult<(Self, Self)> {
		let (r_pipe, w_pipe) = pipe().map_err(|_| ShErr::from_io())?;
		Ok((Self::from_owned_fd(r_pipe), Self::from_owned_fd(w_pipe)))
	}

	/// Create a `RustFd` by consuming ownership of an FD
	pub fn from_owned_fd<T: IntoRawFd>(fd: T) -> Self {
		Self { fd: fd.into_raw_fd() }
	}

	/// Duplicate 'self' onto the given target file descriptor
	pub fn dup2<T: AsRawFd>(&self, target: &T) -> ShResult<()> {
		let target_fd = target.as_raw_fd();
		if self.fd == target_fd {
			// Nothing to do here
			return Ok(())
		}
		if !self.is_valid() || target_fd < 0 {
			return Err(ShErr::Io("attempted to call `dup2()` on an invalid RustFd".into()))
		}
		dup2(self.fd, target_fd)?;
		Ok(())
	}

	pub fn close(&mut self) -> ShResult<()> {
		if !self.is_valid() {
			return Ok(())
		}
		close(self.fd)?;
		self.fd = -1;
		Ok(())
	}

	pub fn is_valid(&self) -> bool {
		self.fd >= 0
	}
}

impl AsRawFd for RustFd {
	fn as_raw_fd(&self) -> RawFd {
		self.fd
	}
}

impl Display for RustFd {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.fd)
	}
}

impl Drop for RustFd {
	fn drop(&mut self) {
		if self.fd >= 0 && self.close().is_err() {
		}
	}
}
