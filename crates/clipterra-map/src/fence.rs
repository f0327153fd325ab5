use crate::GpuFence;

/// CPU-side buffers that must stay alive until `fence` passes.
pub struct PendingReleaseBatch<F, T> {
    pub fence: F,
    pub buffers: Vec<T>,
}

/// Defers dropping buffers until the GPU is done reading them.
///
/// Buffers used by GPU work in the current frame are [`stage`](Self::stage)d. After the last such work has been submitted,
/// [`submit`](Self::submit) parks all staged buffers behind a single new fence. [`release_passed`](Self::release_passed)
/// then drops every batch whose fence has passed, in whatever order the fences pass.
pub struct FenceReleaseQueue<F, T> {
    staged: Vec<T>,
    pending: Vec<PendingReleaseBatch<F, T>>,
}

impl<F, T> Default for FenceReleaseQueue<F, T> {
    fn default() -> Self {
        Self {
            staged: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl<F: GpuFence, T> FenceReleaseQueue<F, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, buffer: T) {
        self.staged.push(buffer);
    }

    /// Creates a fence with `make_fence` only if something was staged since the last submit. Returns `true` if a fence was
    /// created.
    pub fn submit(&mut self, make_fence: impl FnOnce() -> F) -> bool {
        if self.staged.is_empty() {
            return false;
        }
        let buffers = std::mem::take(&mut self.staged);
        self.pending.push(PendingReleaseBatch {
            fence: make_fence(),
            buffers,
        });
        true
    }

    /// Drops the buffers of every batch whose fence has passed and returns how many buffers were dropped.
    pub fn release_passed(&mut self) -> usize {
        let mut released = 0;
        self.pending.retain(|batch| {
            if batch.fence.has_passed() {
                released += batch.buffers.len();
                false
            } else {
                true
            }
        });
        if released > 0 {
            log::debug!("Released {} tile buffers", released);
        }
        released
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    pub fn outstanding_fences(&self) -> usize {
        self.pending.len()
    }

    pub fn outstanding_buffers(&self) -> usize {
        self.pending.iter().map(|b| b.buffers.len()).sum()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
