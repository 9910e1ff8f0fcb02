//! Non-volatile key/value store

/// Persistent store of integer fields
///
/// Values written with [`ConfigStore::set_i32`] must survive a reset only after
/// [`ConfigStore::commit`] returns successfully.
pub trait ConfigStore {
    type Error: core::fmt::Debug;

    /// Reads a field. Returns `Ok(None)` if the key was never written.
    fn get_i32(&mut self, key: &str) -> Result<Option<i32>, Self::Error>;

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), Self::Error>;

    fn commit(&mut self) -> Result<(), Self::Error>;
}
