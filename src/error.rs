/// Error type for MA600 operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the sensor
    Communication(E),
    /// Write rejected because the target register is read-only
    ReadOnlyRegister(u8),
    /// The NVM busy flag did not clear within the poll budget
    NvmTimeout,
}
