//! Capture-interface selection.
//!
//! An explicit override (env var or config) always wins; otherwise
//! devices are ranked by name plausibility and address quality so the
//! monitor lands on a real LAN/Wi-Fi adapter rather than loopback or a
//! virtualization artifact.

use std::net::IpAddr;
use tracing::{debug, info};

use crate::error::{FlowSentryError, Result};

use super::CaptureConfig;

/// Environment override, consulted before the config file.
pub const IFACE_ENV: &str = "FLOWSENTRY_IFACE";

const INVALID_KEYWORDS: &[&str] = &["loopback", "npcap", "vmnet", "hyper-v", "virtual", "bridge"];
const VALID_KEYWORDS: &[&str] = &[
    "wi-fi", "wifi", "ethernet", "lan", "wlan", "intel", "realtek", "qualcomm",
];

fn is_invalid_name(lname: &str) -> bool {
    if lname == "lo" || lname == "lo0" {
        return true;
    }
    INVALID_KEYWORDS.iter().any(|bad| lname.contains(bad))
}

fn has_valid_keyword(lname: &str) -> bool {
    VALID_KEYWORDS.iter().any(|good| lname.contains(good))
}

/// Rank an IPv4 address: private LAN ranges beat other routable
/// addresses, which beat loopback/link-local, which beat nothing.
fn ip_score(ip: Option<IpAddr>) -> u8 {
    let v4 = match ip {
        Some(IpAddr::V4(v4)) => v4,
        _ => return 0,
    };
    if v4.is_unspecified() {
        return 0;
    }
    if v4.is_loopback() || v4.is_link_local() {
        return 1;
    }
    if v4.is_private() {
        return 3;
    }
    2
}

fn device_ipv4(device: &pcap::Device) -> Option<IpAddr> {
    device
        .addresses
        .iter()
        .map(|a| a.addr)
        .find(|a| matches!(a, IpAddr::V4(_)))
}

fn select_best_by_ip(devices: Vec<pcap::Device>) -> Option<pcap::Device> {
    devices
        .into_iter()
        .enumerate()
        .max_by_key(|(idx, d)| (ip_score(device_ipv4(d)), std::cmp::Reverse(*idx)))
        .map(|(_, d)| d)
}

/// Pick the capture device.
///
/// Order: `FLOWSENTRY_IFACE` env var, then the configured interface,
/// then name/address heuristics over the device list, finally the first
/// listed device.
pub fn choose_interface(config: &CaptureConfig) -> Result<pcap::Device> {
    if let Ok(name) = std::env::var(IFACE_ENV) {
        if !name.is_empty() {
            info!("Using {} override: {}", IFACE_ENV, name);
            return Ok(pcap::Device::from(name.as_str()));
        }
    }
    if let Some(name) = &config.interface {
        info!("Using configured capture interface: {}", name);
        return Ok(pcap::Device::from(name.as_str()));
    }

    let devices = pcap::Device::list().map_err(|e| FlowSentryError::Capture(e.to_string()))?;
    for device in &devices {
        debug!(
            "Capture candidate {} ({:?})",
            device.name,
            device_ipv4(device)
        );
    }

    // First pass: adapters whose name looks like a real LAN/Wi-Fi device.
    let name_candidates: Vec<pcap::Device> = devices
        .iter()
        .filter(|d| {
            let lname = d.name.to_lowercase();
            !is_invalid_name(&lname) && has_valid_keyword(&lname)
        })
        .cloned()
        .collect();

    let candidates = if !name_candidates.is_empty() {
        let with_ipv4: Vec<pcap::Device> = name_candidates
            .iter()
            .filter(|d| ip_score(device_ipv4(d)) > 0)
            .cloned()
            .collect();
        if with_ipv4.is_empty() { name_candidates } else { with_ipv4 }
    } else {
        // Second pass: anything that is not loopback/virtual.
        let non_loopback: Vec<pcap::Device> = devices
            .iter()
            .filter(|d| !is_invalid_name(&d.name.to_lowercase()))
            .cloned()
            .collect();
        let with_ipv4: Vec<pcap::Device> = non_loopback
            .iter()
            .filter(|d| ip_score(device_ipv4(d)) > 0)
            .cloned()
            .collect();
        if with_ipv4.is_empty() { non_loopback } else { with_ipv4 }
    };

    let selected = select_best_by_ip(candidates)
        .or_else(|| devices.into_iter().next())
        .ok_or(FlowSentryError::NoInterface)?;

    info!("Selected capture interface: {}", selected.name);
    Ok(selected)
}
