// Bindable commands for host UI controls

use playsample_core::Result;

type ExecuteFn<T> = Box<dyn Fn(T) -> Result<()> + Send + Sync>;
type CanExecuteFn = Box<dyn Fn() -> bool + Send + Sync>;

/// Command a host control can bind to
/// Executing while `can_execute` is false is a no-op that reports `Ok(false)`
pub struct RelayCommand<T> {
    name: &'static str,
    execute: ExecuteFn<T>,
    can_execute: CanExecuteFn,
}

impl<T> RelayCommand<T> {
    pub fn new<F>(name: &'static str, execute: F) -> Self
    where
        F: Fn(T) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name,
            execute: Box::new(execute),
            can_execute: Box::new(|| true),
        }
    }

    pub fn with_can_execute<P>(mut self, can_execute: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        self.can_execute = Box::new(can_execute);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn can_execute(&self) -> bool {
        (self.can_execute)()
    }

    /// Run the command; `Ok(true)` when it ran
    pub fn execute(&self, argument: T) -> Result<bool> {
        if !self.can_execute() {
            log::debug!("Command '{}' ignored, cannot execute", self.name);
            return Ok(false);
        }
        log::trace!("Executing command '{}'", self.name);
        (self.execute)(argument)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use playsample_core::SampleError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_execute_passes_argument() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let command = RelayCommand::new("record", move |value: u32| {
            sink.lock().push(value);
            Ok(())
        });

        assert_eq!(command.name(), "record");
        assert!(command.execute(7).unwrap());
        assert_eq!(received.lock().as_slice(), &[7]);
    }

    #[test]
    fn test_disabled_command_is_noop() {
        let enabled = Arc::new(AtomicBool::new(false));
        let ran = Arc::new(AtomicBool::new(false));
        let (gate, flag) = (enabled.clone(), ran.clone());
        let command = RelayCommand::new("gated", move |_: ()| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .with_can_execute(move || gate.load(Ordering::SeqCst));

        assert!(!command.can_execute());
        assert!(!command.execute(()).unwrap());
        assert!(!ran.load(Ordering::SeqCst));

        enabled.store(true, Ordering::SeqCst);
        assert!(command.execute(()).unwrap());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_errors_propagate() {
        let command = RelayCommand::new("failing", |_: ()| {
            Err(SampleError::Playback("boom".to_string()))
        });

        assert!(matches!(command.execute(()), Err(SampleError::Playback(_))));
    }
}
