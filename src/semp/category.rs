//! Statistic categories and their static routing

use std::fmt;
use std::str::FromStr;

use super::descriptor::MetricDesc;
use super::{v1, v2};
use crate::error::SempError;

/// Wire dialect of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `POST /SEMP` with an XML RPC command
    V1Xml,
    /// `GET /SEMP/v2/monitor/...` returning JSON
    V2Json,
}

/// Broker platforms a category can be scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Any,
    SoftwareOnly,
    HardwareOnly,
}

/// One statistic category; data source names resolve to these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Version,
    Health,
    Disk,
    Redundancy,
    VpnStats,
    BridgeStats,
    QueueDetails,
    ClientStats,
    VpnStatsV2,
    QueueStatsV2,
    ClientStatsV2,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Version,
        Category::Health,
        Category::Disk,
        Category::Redundancy,
        Category::VpnStats,
        Category::BridgeStats,
        Category::QueueDetails,
        Category::ClientStats,
        Category::VpnStatsV2,
        Category::QueueStatsV2,
        Category::ClientStatsV2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Version => "Version",
            Category::Health => "Health",
            Category::Disk => "Disk",
            Category::Redundancy => "Redundancy",
            Category::VpnStats => "VpnStats",
            Category::BridgeStats => "BridgeStats",
            Category::QueueDetails => "QueueDetails",
            Category::ClientStats => "ClientStats",
            Category::VpnStatsV2 => "VpnStatsV2",
            Category::QueueStatsV2 => "QueueStatsV2",
            Category::ClientStatsV2 => "ClientStatsV2",
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Category::VpnStatsV2 | Category::QueueStatsV2 | Category::ClientStatsV2 => {
                Dialect::V2Json
            }
            _ => Dialect::V1Xml,
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Category::Health => Platform::SoftwareOnly,
            Category::Disk => Platform::HardwareOnly,
            _ => Platform::Any,
        }
    }

    /// Whether this category can be scraped from the configured broker type
    pub fn applies_to(&self, is_hw_broker: bool) -> bool {
        match self.platform() {
            Platform::Any => true,
            Platform::SoftwareOnly => !is_hw_broker,
            Platform::HardwareOnly => is_hw_broker,
        }
    }

    /// Every descriptor this category can emit, in emission order
    pub fn descriptors(&self) -> Vec<&'static MetricDesc> {
        match self.dialect() {
            Dialect::V1Xml => v1::descriptors(*self),
            Dialect::V2Json => v2::schema(*self)
                .map(|schema| schema.fields.iter().map(|f| &f.desc).collect())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = SempError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| SempError::UnknownCategory(s.to_string()))
    }
}
