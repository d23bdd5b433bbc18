/// Runs a closure when dropped, including while unwinding.
pub struct OnExit<F: FnOnce()> {
    action: Option<F>,
}

pub fn on_exit<F: FnOnce()>(action: F) -> OnExit<F> {
    OnExit {
        action: Some(action),
    }
}

impl<F: FnOnce()> Drop for OnExit<F> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}
