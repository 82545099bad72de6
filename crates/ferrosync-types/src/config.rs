//! Configuration types for ferrosync
//!
//! Validated newtypes shared by the configuration loader, the copy engine and the
//! scheduler.

use chrono::NaiveTime;
use std::fmt;
use std::str::FromStr;

/// Copy buffer size with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferSize(usize);

impl BufferSize {
    /// Minimum buffer size (4KB)
    pub const MIN: usize = 4 * 1024;
    /// Maximum buffer size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default buffer size (1MB)
    pub const DEFAULT: usize = 1024 * 1024;

    /// Create a new buffer size with validation
    pub fn new(size: usize) -> Result<Self, String> {
        if size < Self::MIN {
            Err(format!("Buffer size {} is below minimum {}", size, Self::MIN))
        } else if size > Self::MAX {
            Err(format!("Buffer size {} exceeds maximum {}", size, Self::MAX))
        } else if !size.is_power_of_two() {
            Err(format!("Buffer size {} must be a power of two", size))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the buffer size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BufferSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Local wall-clock time of day at which a scheduled backup runs
///
/// Parsed strictly from `HH:MM` on a 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DailyTime {
    hour: u32,
    minute: u32,
}

impl DailyTime {
    /// Create a daily time with validation
    pub fn new(hour: u32, minute: u32) -> Result<Self, String> {
        if hour > 23 {
            Err(format!("Hour {} must be between 00 and 23", hour))
        } else if minute > 59 {
            Err(format!("Minute {} must be between 00 and 59", minute))
        } else {
            Ok(Self { hour, minute })
        }
    }

    /// Hour of day (0-23)
    pub fn hour(self) -> u32 {
        self.hour
    }

    /// Minute of hour (0-59)
    pub fn minute(self) -> u32 {
        self.minute
    }

    /// Convert to a chrono time of day
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for DailyTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid time '{}': expected HH:MM (24-hour)", s);
        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2
            || minute.len() != 2
            || !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Default for DailyTime {
    fn default() -> Self {
        Self { hour: 2, minute: 0 }
    }
}
