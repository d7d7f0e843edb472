/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::OnceCell;

mod metadata;
pub use metadata::{GceMetadata, InstanceMetadata};

pub const HOSTNAME_LABEL: &str = "hostname";

static DETECTED_HOST: OnceCell<String> = OnceCell::new();

/// The hostname label of this process.
///
/// Detected once on first access and shared by every later caller. On the
/// cloud platform this is the instance name from the metadata server,
/// elsewhere the OS hostname. Detection failures leave it empty.
pub fn hostname() -> &'static str {
    DETECTED_HOST.get_or_init(|| detect_hostname(&GceMetadata::default()))
}

/// Insert the `hostname` label into `labels`.
pub fn with_hostname(labels: &mut BTreeMap<String, String>) {
    labels.insert(HOSTNAME_LABEL.to_string(), hostname().to_string());
}

pub fn detect_hostname(metadata: &dyn InstanceMetadata) -> String {
    if metadata.on_cloud() {
        match metadata.instance_name() {
            Ok(name) => name,
            Err(e) => {
                debug!("failed to get instance name from metadata server: {e:?}");
                String::new()
            }
        }
    } else {
        match os_hostname() {
            Ok(name) => name,
            Err(e) => {
                debug!("failed to get local hostname: {e:?}");
                String::new()
            }
        }
    }
}

#[cfg(unix)]
fn os_hostname() -> anyhow::Result<String> {
    let uname = rustix::system::uname();
    let name = uname.nodename().to_string_lossy().to_string();
    if name.is_empty() {
        Err(anyhow::anyhow!("empty nodename"))
    } else {
        Ok(name)
    }
}

#[cfg(windows)]
fn os_hostname() -> anyhow::Result<String> {
    use windows_sys::Win32::System::SystemInformation;

    let mut size = 0;
    unsafe {
        SystemInformation::GetComputerNameExW(
            SystemInformation::ComputerNamePhysicalDnsHostname,
            std::ptr::null_mut(),
            &mut size,
        );
    }
    if size == 0 {
        return Err(anyhow::anyhow!("no physical dns hostname"));
    }

    let mut buffer = vec![0u16; size as usize];
    let ok = unsafe {
        SystemInformation::GetComputerNameExW(
            SystemInformation::ComputerNamePhysicalDnsHostname,
            buffer.as_mut_ptr(),
            &mut size,
        )
    };
    if ok == 0 {
        return Err(anyhow::anyhow!("GetComputerNameExW failed"));
    }
    buffer.truncate(size as usize);
    Ok(String::from_utf16_lossy(&buffer))
}

#[cfg(not(any(unix, windows)))]
fn os_hostname() -> anyhow::Result<String> {
    Err(anyhow::anyhow!("hostname lookup is not supported on this platform"))
}
