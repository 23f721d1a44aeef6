//! Virtual clock for deferred page work. Nothing runs until the host advances
//! time, so tests control every timer explicitly.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskKind {
    Announce(String),
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    kind: TaskKind,
}

/// Public view of a queued timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub id: i64,
    pub due_at: i64,
}

#[derive(Debug)]
pub(crate) struct Scheduler {
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    next_timer_id: i64,
    next_task_order: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }
}

impl Scheduler {
    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn schedule(&mut self, delay_ms: i64, kind: TaskKind) -> i64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        self.task_queue.push(ScheduledTask {
            id,
            due_at: self.now_ms.saturating_add(delay_ms.max(0)),
            order,
            kind,
        });
        id
    }

    /// Moves the clock forward and returns the tasks that became due, in
    /// due-time then scheduling order.
    pub(crate) fn advance(&mut self, delta_ms: i64) -> Vec<TaskKind> {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        let now = self.now_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.task_queue)
            .into_iter()
            .partition(|task| task.due_at <= now);
        self.task_queue = pending;
        due.sort_by_key(|task| (task.due_at, task.order));
        due.into_iter().map(|task| task.kind).collect()
    }

    pub(crate) fn pending(&self) -> Vec<PendingTask> {
        let mut tasks = self.task_queue.clone();
        tasks.sort_by_key(|task| (task.due_at, task.order));
        tasks
            .into_iter()
            .map(|task| PendingTask {
                id: task.id,
                due_at: task.due_at,
            })
            .collect()
    }
}
