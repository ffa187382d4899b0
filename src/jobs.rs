use log::debug;
use once_cell::sync::Lazy;

use std::sync::Mutex;

use crate::prelude::*;
use crate::signal::{self, SigMaskGuard};
use crate::terminal;

/// What the kernel last told us about one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
	Running,
	Stopped,
	Terminated,
}

impl Display for ProcState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProcState::Running => write!(f, "Running"),
			ProcState::Stopped => write!(f, "Stopped"),
			ProcState::Terminated => write!(f, "Terminated"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Process {
	pid: Pid,
	command: String,
	state: ProcState,
}

impl Process {
	pub fn new(pid: Pid, command: String) -> Self {
		Self { pid, command, state: ProcState::Running }
	}

	pub fn pid(&self) -> Pid {
		self.pid
	}

	pub fn command(&self) -> &str {
		&self.command
	}

	pub fn state(&self) -> ProcState {
		self.state
	}

	/// Running and Stopped flip back and forth; Terminated is final.
	pub fn set_state(&mut self, state: ProcState) {
		if self.state == ProcState::Terminated {
			return
		}
		self.state = state;
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
	Foreground,
	Background,
}

impl Display for JobState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			JobState::Foreground => write!(f, "Foreground"),
			JobState::Background => write!(f, "Background"),
		}
	}
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct JobCmdFlags: u8 {
		const PIDS    = 0b001;
		const RUNNING = 0b010;
		const STOPPED = 0b100;
	}
}

/// One pipeline's worth of processes sharing a process group. The group id
/// is stamped by the first process added and never moves after that.
#[derive(Debug, Clone)]
pub struct Job {
	num: usize,
	pgid: Option<Pid>,
	state: JobState,
	processes: Vec<Process>,
}

impl Job {
	fn new(num: usize, state: JobState) -> Self {
		Self { num, pgid: None, state, processes: vec![] }
	}

	pub fn num(&self) -> usize {
		self.num
	}

	pub fn pgid(&self) -> Option<Pid> {
		self.pgid
	}

	pub fn state(&self) -> JobState {
		self.state
	}

	pub fn set_state(&mut self, state: JobState) {
		self.state = state;
	}

	pub fn processes(&self) -> &[Process] {
		&self.processes
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.processes.iter().map(|p| p.pid()).collect()
	}

	pub fn add_process(&mut self, process: Process) {
		if self.pgid.is_none() {
			self.pgid = Some(process.pid());
		}
		self.processes.push(process);
	}

	pub fn contains_process(&self, pid: Pid) -> bool {
		self.processes.iter().any(|p| p.pid() == pid)
	}

	pub fn get_process_mut(&mut self, pid: Pid) -> Option<&mut Process> {
		self.processes.iter_mut().find(|p| p.pid() == pid)
	}

	pub fn is_finished(&self) -> bool {
		self.processes.iter().all(|p| p.state() == ProcState::Terminated)
	}

	/// True when nothing in the job can make progress: no member is Running.
	pub fn is_stopped(&self) -> bool {
		!self.processes.iter().any(|p| p.state() == ProcState::Running)
	}

	pub fn has_running(&self) -> bool {
		self.processes.iter().any(|p| p.state() == ProcState::Running)
	}

	pub fn has_stopped(&self) -> bool {
		self.processes.iter().any(|p| p.state() == ProcState::Stopped)
	}

	/// Signal the whole process group at once.
	pub fn killpg(&self, sig: Signal) -> ShResult<()> {
		if let Some(pgid) = self.pgid {
			killpg(pgid, sig)?;
		}
		Ok(())
	}

	/// SIGCONT has been sent to every member; reflect that eagerly so a job
	/// moved to the foreground is not mistaken for a stopped one before the
	/// kernel reports the Continued events.
	pub fn mark_continued(&mut self) {
		for process in self.processes.iter_mut() {
			process.set_state(ProcState::Running);
		}
	}

	pub fn display(&self, flags: JobCmdFlags) -> String {
		if flags.contains(JobCmdFlags::PIDS) {
			let pids = self
				.processes
				.iter()
				.map(|p| p.pid().to_string())
				.collect::<Vec<_>>()
				.join(" ");
			return format!("[{}] {}", self.num, pids)
		}
		let commands = self
			.processes
			.iter()
			.map(|p| p.command().to_string())
			.collect::<Vec<_>>()
			.join(" | ");
		let pgid = self.pgid.map(|p| p.to_string()).unwrap_or_else(|| "0".into());
		let mut line = format!("[{}] ({}) {}: {}", self.num, pgid, self.state, commands);
		for process in &self.processes {
			line.push_str(&format!("\n    {} {} {}", process.pid(), process.state(), process.command()));
		}
		line
	}
}

/// Owns every live job. Lookup goes through the job number or through any
/// member pid; both indices are kept in step by `add_process` and
/// `synchronize`.
#[derive(Debug, Default)]
pub struct JobTable {
	jobs: BTreeMap<usize, Job>,
	by_pid: HashMap<Pid, usize>,
}

impl JobTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocate the smallest free job number and insert an empty job.
	pub fn add_job(&mut self, state: JobState) -> ShResult<usize> {
		if state == JobState::Foreground && self.has_foreground_job() {
			return Err(ShErr::internal("tried to create a second foreground job"))
		}
		let num = (1..).find(|n| !self.jobs.contains_key(n)).unwrap();
		self.jobs.insert(num, Job::new(num, state));
		debug!("created job [{}]", num);
		Ok(num)
	}

	pub fn contains_job(&self, num: usize) -> bool {
		self.jobs.contains_key(&num)
	}

	pub fn get_job(&self, num: usize) -> Option<&Job> {
		self.jobs.get(&num)
	}

	pub fn get_job_mut(&mut self, num: usize) -> Option<&mut Job> {
		self.jobs.get_mut(&num)
	}

	pub fn add_process(&mut self, num: usize, process: Process) -> ShResult<()> {
		let job = self
			.jobs
			.get_mut(&num)
			.ok_or_else(|| ShErr::internal(format!("no job numbered {}", num)))?;
		self.by_pid.insert(process.pid(), num);
		job.add_process(process);
		Ok(())
	}

	pub fn contains_process(&self, pid: Pid) -> bool {
		self.by_pid.contains_key(&pid)
	}

	pub fn job_with_process(&self, pid: Pid) -> Option<&Job> {
		self.jobs.get(self.by_pid.get(&pid)?)
	}

	pub fn has_foreground_job(&self) -> bool {
		self.foreground_job().is_some()
	}

	pub fn foreground_job(&self) -> Option<&Job> {
		self.jobs.values().find(|j| j.state() == JobState::Foreground)
	}

	pub fn foreground_pgid(&self) -> Option<Pid> {
		self.foreground_job().and_then(|j| j.pgid())
	}

	/// Fold a wait event into the owning job. Returns the job number so the
	/// caller can `synchronize` it.
	pub fn set_process_state(&mut self, pid: Pid, state: ProcState) -> Option<usize> {
		let num = *self.by_pid.get(&pid)?;
		self.jobs.get_mut(&num)?.get_process_mut(pid)?.set_state(state);
		Some(num)
	}

	/// Reconcile one job with the states of its members. A job whose members
	/// have all terminated is removed and its number freed; a foreground job
	/// with no runnable member is demoted and the terminal comes back to the
	/// shell. Calling this twice with no intervening event changes nothing.
	///
	/// Runs in signal context too, so nothing in here may allocate a lock
	/// the interrupted flow might hold. That rules out logging.
	pub fn synchronize(&mut self, num: usize) {
		let Some(job) = self.jobs.get(&num) else { return };
		let was_foreground = job.state() == JobState::Foreground;

		if job.is_finished() {
			for pid in job.pids() {
				self.by_pid.remove(&pid);
			}
			self.jobs.remove(&num);
			if was_foreground {
				let _ = terminal::take_terminal_back();
			}
			return
		}

		if was_foreground && job.is_stopped() {
			if let Some(job) = self.jobs.get_mut(&num) {
				job.set_state(JobState::Background);
			}
			let _ = terminal::take_terminal_back();
		}
	}

	/// One line per job in job-number order, filtered by `flags`.
	pub fn listing(&self, flags: JobCmdFlags) -> String {
		self.jobs
			.values()
			.filter(|job| !flags.contains(JobCmdFlags::RUNNING) || job.has_running())
			.filter(|job| !flags.contains(JobCmdFlags::STOPPED) || job.has_stopped())
			.map(|job| job.display(flags))
			.collect::<Vec<_>>()
			.join("\n")
	}
}

static JOB_TABLE: Lazy<Mutex<JobTable>> = Lazy::new(|| Mutex::new(JobTable::new()));

/// Force the table into existence. Must happen before the first signal
/// handler is installed; handlers cannot be the ones to initialize it.
pub fn init_job_table() {
	Lazy::force(&JOB_TABLE);
}

/// Run `f` against the job table with the job-control signals blocked for
/// the duration. This is the only way the normal flow may touch the table;
/// the reaper gets its turn at the next sigsuspend or unblock boundary.
pub fn write_jobs<F, T>(f: F) -> ShResult<T>
where
	F: FnOnce(&mut JobTable) -> T,
{
	let _guard = SigMaskGuard::block(&signal::job_control_set())?;
	let mut table = JOB_TABLE
		.lock()
		.map_err(|_| ShErr::internal("job table lock poisoned"))?;
	Ok(f(&mut table))
}

pub fn read_jobs<F, T>(f: F) -> ShResult<T>
where
	F: FnOnce(&JobTable) -> T,
{
	write_jobs(|table| f(table))
}

/// Handler-side access. Signal delivery only happens while no mask guard is
/// live, so the lock is always free here; try_lock is a belt against a
/// violated protocol, not a wait.
pub(crate) fn with_jobs_in_handler<F>(f: F)
where
	F: FnOnce(&mut JobTable),
{
	if let Ok(mut table) = JOB_TABLE.try_lock() {
		f(&mut table);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn spawn_fake(table: &mut JobTable, num: usize, pids: &[i32]) {
		for (i, pid) in pids.iter().enumerate() {
			let process = Process::new(Pid::from_raw(*pid), format!("cmd{}", i));
			table.add_process(num, process).unwrap();
		}
	}

	#[test]
	fn job_numbers_are_smallest_free() {
		let mut table = JobTable::new();
		assert_eq!(table.add_job(JobState::Background).unwrap(), 1);
		assert_eq!(table.add_job(JobState::Background).unwrap(), 2);
		assert_eq!(table.add_job(JobState::Background).unwrap(), 3);

		spawn_fake(&mut table, 2, &[200]);
		table.set_process_state(Pid::from_raw(200), ProcState::Terminated);
		table.synchronize(2);
		assert!(!table.contains_job(2));

		assert_eq!(table.add_job(JobState::Background).unwrap(), 2);
	}

	#[test]
	fn pgid_is_first_pid() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, num, &[100, 101, 102]);
		assert_eq!(table.get_job(num).unwrap().pgid(), Some(Pid::from_raw(100)));
	}

	#[test]
	fn pid_lookup_covers_every_member() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, num, &[100, 101]);
		assert!(table.contains_process(Pid::from_raw(100)));
		assert!(table.contains_process(Pid::from_raw(101)));
		assert_eq!(table.job_with_process(Pid::from_raw(101)).map(|j| j.num()), Some(num));
		assert!(!table.contains_process(Pid::from_raw(999)));
	}

	#[test]
	fn only_one_foreground_job() {
		let mut table = JobTable::new();
		table.add_job(JobState::Foreground).unwrap();
		assert!(table.add_job(JobState::Foreground).is_err());
		assert!(table.add_job(JobState::Background).is_ok());
	}

	#[test]
	fn synchronize_reclaims_finished_jobs() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, num, &[100, 101]);

		table.set_process_state(Pid::from_raw(100), ProcState::Terminated);
		table.synchronize(num);
		assert!(table.contains_job(num));

		table.set_process_state(Pid::from_raw(101), ProcState::Terminated);
		table.synchronize(num);
		assert!(!table.contains_job(num));
		assert!(!table.contains_process(Pid::from_raw(100)));
		assert!(!table.contains_process(Pid::from_raw(101)));
	}

	#[test]
	fn synchronize_is_idempotent() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, num, &[100]);
		table.set_process_state(Pid::from_raw(100), ProcState::Stopped);

		table.synchronize(num);
		let before = format!("{:?}", table.get_job(num));
		table.synchronize(num);
		assert_eq!(before, format!("{:?}", table.get_job(num)));
	}

	#[test]
	fn stopped_foreground_job_is_demoted() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Foreground).unwrap();
		spawn_fake(&mut table, num, &[100, 101]);

		table.set_process_state(Pid::from_raw(100), ProcState::Stopped);
		table.synchronize(num);
		assert_eq!(table.get_job(num).unwrap().state(), JobState::Foreground);

		table.set_process_state(Pid::from_raw(101), ProcState::Stopped);
		table.synchronize(num);
		assert_eq!(table.get_job(num).unwrap().state(), JobState::Background);
		assert!(!table.has_foreground_job());
	}

	#[test]
	fn terminated_is_terminal() {
		let mut process = Process::new(Pid::from_raw(100), "cmd".into());
		process.set_state(ProcState::Stopped);
		assert_eq!(process.state(), ProcState::Stopped);
		process.set_state(ProcState::Running);
		assert_eq!(process.state(), ProcState::Running);
		process.set_state(ProcState::Terminated);
		process.set_state(ProcState::Running);
		assert_eq!(process.state(), ProcState::Terminated);
	}

	#[test]
	fn mark_continued_skips_the_dead() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, num, &[100, 101]);
		table.set_process_state(Pid::from_raw(100), ProcState::Terminated);
		table.set_process_state(Pid::from_raw(101), ProcState::Stopped);

		table.get_job_mut(num).unwrap().mark_continued();
		let job = table.get_job(num).unwrap();
		assert_eq!(job.processes()[0].state(), ProcState::Terminated);
		assert_eq!(job.processes()[1].state(), ProcState::Running);
	}

	#[test]
	fn listing_format() {
		let mut table = JobTable::new();
		let num = table.add_job(JobState::Background).unwrap();
		table.add_process(num, Process::new(Pid::from_raw(100), "sleep 30".into())).unwrap();
		table.add_process(num, Process::new(Pid::from_raw(101), "wc -l".into())).unwrap();

		let expected = "[1] (100) Background: sleep 30 | wc -l\n    100 Running sleep 30\n    101 Running wc -l";
		assert_eq!(table.listing(JobCmdFlags::empty()), expected);
		assert_eq!(table.listing(JobCmdFlags::PIDS), "[1] 100 101");
	}

	#[test]
	fn listing_filters() {
		let mut table = JobTable::new();
		let first = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, first, &[100]);
		let second = table.add_job(JobState::Background).unwrap();
		spawn_fake(&mut table, second, &[200]);
		table.set_process_state(Pid::from_raw(200), ProcState::Stopped);

		let running = table.listing(JobCmdFlags::RUNNING);
		assert!(running.contains("[1]"));
		assert!(!running.contains("[2]"));

		let stopped = table.listing(JobCmdFlags::STOPPED);
		assert!(!stopped.contains("[1]"));
		assert!(stopped.contains("[2]"));
	}
}
