use std::collections::BTreeMap;
use std::fmt;

/// Logic level of a single line. `HighZ` means nobody drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinValue {
    Low,
    High,
    HighZ, // Tri-state
}

impl PinValue {
    pub fn to_str(&self) -> &'static str {
        match self {
            PinValue::Low => "Low",
            PinValue::High => "High",
            PinValue::HighZ => "HighZ",
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            PinValue::Low => '0',
            PinValue::High => '1',
            PinValue::HighZ => 'Z',
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            PinValue::High
        } else {
            PinValue::Low
        }
    }

    /// `None` for a released line. Never coerce that to a level.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            PinValue::Low => Some(false),
            PinValue::High => Some(true),
            PinValue::HighZ => None,
        }
    }

    pub fn is_driven(&self) -> bool {
        !matches!(self, PinValue::HighZ)
    }

    /// Logical complement of a driven level; a released line stays released.
    pub fn inverted(&self) -> Self {
        match self {
            PinValue::Low => PinValue::High,
            PinValue::High => PinValue::Low,
            PinValue::HighZ => PinValue::HighZ,
        }
    }
}

impl fmt::Display for PinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A named net with any number of named drivers.
///
/// Drivers that release the line are removed rather than stored as `HighZ`, so an
/// empty driver map always resolves to `HighZ`. When two drivers disagree the pin is
/// contended; the resolved level follows wired-AND (Low dominates).
#[derive(Debug, Clone)]
pub struct Pin {
    name: String,
    drivers: BTreeMap<String, PinValue>,
    settled_value: PinValue,
}

impl Pin {
    pub fn new(name: impl Into<String>) -> Self {
        Pin {
            name: name.into(),
            drivers: BTreeMap::new(),
            settled_value: PinValue::HighZ,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_driver(&mut self, driver_name: &str, value: PinValue) {
        if value == PinValue::HighZ {
            self.drivers.remove(driver_name);
        } else {
            self.drivers.insert(driver_name.to_string(), value);
        }
        self.recalculate_value();
    }

    pub fn release(&mut self, driver_name: &str) {
        self.set_driver(driver_name, PinValue::HighZ);
    }

    pub fn read(&self) -> PinValue {
        self.settled_value
    }

    pub fn drivers(&self) -> &BTreeMap<String, PinValue> {
        &self.drivers
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// True when at least two drivers assert different levels.
    pub fn is_contended(&self) -> bool {
        let mut levels = self.drivers.values();
        match levels.next() {
            Some(first) => levels.any(|v| v != first),
            None => false,
        }
    }

    fn recalculate_value(&mut self) {
        self.settled_value = if self.drivers.is_empty() {
            PinValue::HighZ
        } else if self.drivers.values().any(|v| *v == PinValue::Low) {
            PinValue::Low
        } else {
            PinValue::High
        };
    }
}

impl Default for Pin {
    fn default() -> Self {
        Pin::new("unnamed")
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.settled_value)?;

        if !self.drivers.is_empty() {
            write!(f, " [drivers: ")?;
            for (i, (driver, value)) in self.drivers.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", driver, value.to_char())?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}
