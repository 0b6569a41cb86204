//! RAII guard for terminal ownership during raw mode operations

use rawtty::TerminalBackend;

/// Owns a backend and the snapshot taken when raw mode was entered, so the
/// terminal is restored exactly once however the session ends.
pub struct TerminalGuard<B: TerminalBackend> {
    backend: B,
    snapshot: Option<B::Snapshot>,
    // Marker to ensure this type is !Send and !Sync
    _marker: std::marker::PhantomData<*const ()>,
}

impl<B: TerminalBackend> TerminalGuard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            snapshot: None,
            _marker: std::marker::PhantomData,
        }
    }

    /// Enable raw mode on the terminal.
    pub fn enable_raw_mode(&mut self) -> rawtty::Result<()> {
        if self.snapshot.is_none() {
            self.snapshot = Some(self.backend.enable_raw_mode()?);
        }
        Ok(())
    }

    /// Disable raw mode on the terminal.
    pub fn disable_raw_mode(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.backend.disable_raw_mode(snapshot);
        }
    }

    /// Check if raw mode is currently enabled
    pub fn is_raw_mode(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: TerminalBackend> Drop for TerminalGuard<B> {
    fn drop(&mut self) {
        self.disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawtty::Result;
    use std::io;

    #[derive(Default)]
    struct Counting {
        entered: usize,
        restored: Vec<usize>,
    }

    impl TerminalBackend for Counting {
        type Snapshot = usize;

        fn enable_raw_mode(&mut self) -> Result<usize> {
            self.entered += 1;
            Ok(self.entered)
        }

        fn disable_raw_mode(&mut self, snapshot: usize) {
            self.restored.push(snapshot);
        }

        fn columns(&mut self) -> Result<u16> {
            Ok(80)
        }

        fn read_input(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn write_output(&mut self, _buf: &[u8]) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn enable_is_idempotent() {
        let mut guard = TerminalGuard::new(Counting::default());
        guard.enable_raw_mode().unwrap();
        guard.enable_raw_mode().unwrap();

        assert!(guard.is_raw_mode());
        assert_eq!(guard.backend().entered, 1);
    }

    #[test]
    fn snapshot_is_restored_once() {
        let mut backend = Counting::default();
        {
            let mut guard = TerminalGuard::new(&mut backend);
            guard.enable_raw_mode().unwrap();
            guard.disable_raw_mode();
            assert!(!guard.is_raw_mode());
        }
        assert_eq!(backend.restored, vec![1]);
    }

    #[test]
    fn drop_restores() {
        let mut backend = Counting::default();
        {
            let mut guard = TerminalGuard::new(&mut backend);
            guard.enable_raw_mode().unwrap();
        }
        assert_eq!(backend.restored, vec![1]);
    }

    #[test]
    fn drop_without_raw_mode_does_nothing() {
        let mut backend = Counting::default();
        drop(TerminalGuard::new(&mut backend));
        assert!(backend.restored.is_empty());
    }
}
