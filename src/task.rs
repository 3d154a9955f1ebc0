//! Transfer task queue.
//!
//! Every bus transfer, during bring-up and afterwards, goes through the same
//! four calls in the same order:
//!
//! 1. [`allocate`](TransferQueue::allocate) reserves a buffer of an exact size
//! 2. [`commit`](TransferQueue::commit) fixes the opcode and the payload
//! 3. [`run`](TransferQueue::run) puts the task on the wire
//! 4. [`done`](TransferQueue::done) hands the buffer back to the pool
//!
//! Anything else (skipping a step, repeating one, using a handle after
//! `done`) is rejected with a [`TaskError`].
//!
//! ## Completion of `run`
//!
//! `run` returns when [`Interface::transfer`] returns, i.e. once the
//! transport has accepted the bytes. In [`TransferMode::Synchronous`] the
//! session is then flushed and closed, so the task is on the wire when `run`
//! returns. In [`TransferMode::Overlapped`] nothing is flushed: the bytes are
//! only guaranteed to be on the wire after the next
//! [`close_session`](TransferQueue::close_session) or [`Interface::flush`].

use heapless::Vec;

use crate::{dcs::CommandFrame, interface::Interface, options::TransferMode};

/// Largest single transfer: one 480 pixel row at 18 bits per pixel.
pub const MAX_TRANSFER_SIZE: usize = 480 * 3;

/// Number of tasks that can be allocated at the same time.
pub const QUEUE_SLOTS: usize = 4;

/// Lifecycle state of a transfer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Buffer reserved, payload being written.
    Allocated,
    /// Opcode and payload fixed.
    Committed,
    /// Handed to the transport.
    Running,
    /// Released, the buffer belongs to the pool again.
    Done,
}

/// Transfer task contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// Requested size is zero or larger than the maximum transfer size.
    InvalidSize(usize),
    /// Every slot is in use.
    PoolExhausted,
    /// The handle does not refer to a live task.
    StaleHandle,
    /// A lifecycle call was made in the wrong state.
    OutOfOrder {
        /// State the call requires.
        expected: TaskState,
        /// State the task was in.
        found: TaskState,
    },
    /// Payload length differs from the size declared at allocation.
    SizeMismatch {
        /// Size passed to `allocate`.
        declared: usize,
        /// Bytes written into the task.
        actual: usize,
    },
    /// More payload was written than declared at allocation.
    Overflow,
}

/// Error returned by [`TransferQueue::run`] and [`TransferQueue::submit`].
#[derive(Debug)]
pub enum RunError<DiError> {
    /// Lifecycle contract violation.
    Task(TaskError),
    /// Error caused by the display interface.
    Interface(DiError),
}

impl<DiError> From<TaskError> for RunError<DiError> {
    fn from(value: TaskError) -> Self {
        Self::Task(value)
    }
}

/// Handle of an allocated task.
///
/// Handles are cheap to copy, a copy used after [`TransferQueue::done`] is
/// detected as [`TaskError::StaleHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    slot: usize,
    generation: u16,
}

struct Slot<const N: usize> {
    state: TaskState,
    generation: u16,
    opcode: u8,
    size: usize,
    data: Vec<u8, N>,
}

impl<const N: usize> Slot<N> {
    const fn new() -> Self {
        Self {
            state: TaskState::Done,
            generation: 0,
            opcode: 0,
            size: 0,
            data: Vec::new(),
        }
    }
}

/// Pool of transfer buffers plus the bus session bookkeeping.
pub struct TransferQueue<const N: usize = MAX_TRANSFER_SIZE, const SLOTS: usize = QUEUE_SLOTS> {
    slots: [Slot<N>; SLOTS],
    mode: TransferMode,
    session_open: bool,
}

impl<const N: usize, const SLOTS: usize> TransferQueue<N, SLOTS> {
    /// Creates an empty queue.
    pub fn new(mode: TransferMode) -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot::new()),
            mode,
            session_open: false,
        }
    }

    /// Session handling of this queue.
    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Returns `true` while an overlapped session is held open.
    pub fn session_open(&self) -> bool {
        self.session_open
    }

    /// Current state of a task.
    pub fn state(&self, task: TaskHandle) -> Result<TaskState, TaskError> {
        Ok(self.slot(task)?.state)
    }

    /// Reserves a buffer of exactly `size` bytes.
    pub fn allocate(&mut self, size: usize) -> Result<TaskHandle, TaskError> {
        if size == 0 || size > N {
            return Err(TaskError::InvalidSize(size));
        }

        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.state == TaskState::Done)
            .ok_or(TaskError::PoolExhausted)?;

        slot.generation = slot.generation.wrapping_add(1);
        slot.state = TaskState::Allocated;
        slot.opcode = 0;
        slot.size = size;
        slot.data.clear();

        Ok(TaskHandle {
            slot: index,
            generation: slot.generation,
        })
    }

    /// Appends payload bytes to an allocated task.
    pub fn write(&mut self, task: TaskHandle, bytes: &[u8]) -> Result<(), TaskError> {
        let slot = self.slot_in(task, TaskState::Allocated)?;
        if slot.data.len() + bytes.len() > slot.size {
            return Err(TaskError::Overflow);
        }
        slot.data
            .extend_from_slice(bytes)
            .map_err(|_| TaskError::Overflow)
    }

    /// Fills the rest of the declared size with `byte`.
    pub fn fill(&mut self, task: TaskHandle, byte: u8) -> Result<(), TaskError> {
        let slot = self.slot_in(task, TaskState::Allocated)?;
        let size = slot.size;
        slot.data.resize(size, byte).map_err(|_| TaskError::Overflow)
    }

    /// Fixes the opcode. The payload must match the allocated size.
    pub fn commit(&mut self, task: TaskHandle, opcode: u8) -> Result<(), TaskError> {
        let slot = self.slot_in(task, TaskState::Allocated)?;
        if slot.data.len() != slot.size {
            return Err(TaskError::SizeMismatch {
                declared: slot.size,
                actual: slot.data.len(),
            });
        }
        slot.opcode = opcode;
        slot.state = TaskState::Committed;
        Ok(())
    }

    /// Puts a committed task on the wire.
    ///
    /// See the [module documentation](crate::task) for when the bytes are
    /// guaranteed to have left the bus. If the interface fails the task is
    /// released and must not be passed to [`done`](Self::done).
    pub fn run<DI: Interface>(
        &mut self,
        di: &mut DI,
        task: TaskHandle,
    ) -> Result<(), RunError<DI::Error>> {
        let index = self.index_in(task, TaskState::Committed)?;
        let slot = &mut self.slots[index];
        slot.state = TaskState::Running;
        log::trace!("task {:#04x}: {} bytes", slot.opcode, slot.data.len());

        let sent = transmit(di, self.mode, &mut self.session_open, slot.opcode, &slot.data);
        if let Err(e) = sent {
            log::warn!("task {:#04x} failed, releasing slot {}", slot.opcode, index);
            slot.state = TaskState::Done;
            slot.data.clear();
            return Err(RunError::Interface(e));
        }
        Ok(())
    }

    /// Releases a task that has run.
    pub fn done(&mut self, task: TaskHandle) -> Result<(), TaskError> {
        let slot = self.slot_in(task, TaskState::Running)?;
        slot.state = TaskState::Done;
        slot.data.clear();
        Ok(())
    }

    /// Sends one command frame through all four lifecycle steps.
    ///
    /// A frame without parameters has nothing to allocate and goes out as a
    /// single-shot transfer with the same session handling as [`run`](Self::run).
    pub fn submit<DI: Interface>(
        &mut self,
        di: &mut DI,
        frame: CommandFrame<'_>,
    ) -> Result<(), RunError<DI::Error>> {
        if frame.params.is_empty() {
            return self.run_bare(di, frame.opcode);
        }

        let task = self.allocate(frame.framed_len())?;
        for byte in frame.framed() {
            self.write(task, &[byte])?;
        }
        self.commit(task, frame.opcode)?;
        self.run(di, task)?;
        self.done(task)?;
        Ok(())
    }

    /// Sends an unframed payload, e.g. pixel data, as a single task.
    pub fn submit_raw<DI: Interface>(
        &mut self,
        di: &mut DI,
        opcode: u8,
        payload: &[u8],
    ) -> Result<(), RunError<DI::Error>> {
        let task = self.allocate(payload.len())?;
        self.write(task, payload)?;
        self.commit(task, opcode)?;
        self.run(di, task)?;
        self.done(task)?;
        Ok(())
    }

    /// Closes an overlapped session once all pending bytes are on the wire.
    pub fn close_session<DI: Interface>(&mut self, di: &mut DI) -> Result<(), DI::Error> {
        if self.session_open {
            di.end_session()?;
            self.session_open = false;
        }
        Ok(())
    }

    fn run_bare<DI: Interface>(
        &mut self,
        di: &mut DI,
        opcode: u8,
    ) -> Result<(), RunError<DI::Error>> {
        log::trace!("task {:#04x}: bare", opcode);
        transmit(di, self.mode, &mut self.session_open, opcode, &[])
            .map_err(RunError::Interface)
    }

    fn slot(&self, task: TaskHandle) -> Result<&Slot<N>, TaskError> {
        self.slots
            .get(task.slot)
            .filter(|slot| slot.generation == task.generation)
            .ok_or(TaskError::StaleHandle)
    }

    fn index_in(&self, task: TaskHandle, expected: TaskState) -> Result<usize, TaskError> {
        let found = self.slot(task)?.state;
        if found != expected {
            return Err(TaskError::OutOfOrder { expected, found });
        }
        Ok(task.slot)
    }

    fn slot_in(
        &mut self,
        task: TaskHandle,
        expected: TaskState,
    ) -> Result<&mut Slot<N>, TaskError> {
        let index = self.index_in(task, expected)?;
        Ok(&mut self.slots[index])
    }
}

/// Sends one transfer with the session handling of `mode`.
///
/// A synchronous session is closed even when the transfer fails. A failed
/// overlapped transfer leaves its session open for
/// [`TransferQueue::close_session`].
fn transmit<DI: Interface>(
    di: &mut DI,
    mode: TransferMode,
    session_open: &mut bool,
    opcode: u8,
    data: &[u8],
) -> Result<(), DI::Error> {
    match mode {
        TransferMode::Synchronous => {
            di.begin_session()?;
            let sent = di.transfer(opcode, data);
            let closed = di.end_session();
            sent.and(closed)
        }
        TransferMode::Overlapped => {
            if !*session_open {
                di.begin_session()?;
                // keep the session open across tasks, closing it in between
                // truncates the command sequence
                *session_open = true;
            }
            di.transfer(opcode, data)
        }
    }
}
