//! Temperature sensor

pub trait TemperatureSensor {
    type Error: core::fmt::Debug;

    /// Reads the temperature in hundredths of a degree Celsius.
    fn read_centi_celsius(&mut self) -> Result<i32, Self::Error>;
}
