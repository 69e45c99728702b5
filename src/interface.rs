//! Network interface enumeration and selection

use pcap::Device;

use crate::error::{Error, Result};

/// A capture device as listed by libpcap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "en0")
    pub name: String,
    /// Human-readable description, empty when libpcap has none
    pub description: String,
}

impl InterfaceInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl From<Device> for InterfaceInfo {
    fn from(device: Device) -> Self {
        Self {
            name: device.name,
            description: device.desc.unwrap_or_default(),
        }
    }
}

/// List all devices libpcap can capture on, in libpcap's order.
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let devices = Device::list().map_err(Error::Enumeration)?;
    Ok(devices.into_iter().map(InterfaceInfo::from).collect())
}

/// Pick the interface at a 1-based `index`.
pub fn select_interface(interfaces: &[InterfaceInfo], index: usize) -> Result<&InterfaceInfo> {
    index
        .checked_sub(1)
        .and_then(|i| interfaces.get(i))
        .ok_or(Error::IndexOutOfRange {
            index,
            count: interfaces.len(),
        })
}

/// Parse what the user typed at the interface prompt.
pub fn parse_selection(input: &str) -> Result<usize> {
    let trimmed = input.trim();
    trimmed.parse().map_err(|_| Error::InvalidSelection {
        input: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<InterfaceInfo> {
        vec![
            InterfaceInfo::new("eth0", "Ethernet"),
            InterfaceInfo::new("lo", ""),
        ]
    }

    #[test]
    fn test_select_first_and_last() {
        let interfaces = sample();
        assert_eq!(select_interface(&interfaces, 1).unwrap().name, "eth0");
        assert_eq!(select_interface(&interfaces, 2).unwrap().name, "lo");
    }

    #[test]
    fn test_select_zero_is_out_of_range() {
        match select_interface(&sample(), 0) {
            Err(Error::IndexOutOfRange { index: 0, count: 2 }) => {}
            other => panic!("Expected IndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_select_past_end_is_out_of_range() {
        assert!(matches!(
            select_interface(&sample(), 3),
            Err(Error::IndexOutOfRange { index: 3, count: 2 })
        ));
        assert!(select_interface(&[], 1).is_err());
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection(" 2\n").unwrap(), 2);
        assert!(matches!(
            parse_selection("two"),
            Err(Error::InvalidSelection { ref input }) if input == "two"
        ));
        assert!(parse_selection("-1").is_err());
        assert!(parse_selection("").is_err());
    }

    #[test]
    fn test_from_device_without_description() {
        let device = Device::from("any");
        let info = InterfaceInfo::from(device);
        assert_eq!(info.name, "any");
        assert_eq!(info.description, "");
    }
}
