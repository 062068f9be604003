//! Minimal end-to-end walkthrough: mount a volume on a given host directory,
//! write a file through the print surface, read it back, verify, list, clean
//! up.

use anyhow::bail;

use super::handle::Mode;
use super::volume::{MountOptions, Volume};
use crate::render::FormatSpec;

pub fn e2e_volume_demo(root: &str) -> anyhow::Result<()> {
    let mut vol = Volume::new();
    let opts = MountOptions::at(root).format_on_fail(true);
    if !vol.mount(&opts) {
        bail!("mount failed at {root}");
    }

    // 1) write a small report through the print family
    let mut out = vol.open("/notes/sensor.txt", Mode::Write);
    if !out.is_open() {
        bail!("cannot create /notes/sensor.txt");
    }
    out.print("reading: ");
    out.println(42);
    out.println_with(3.14159f64, &FormatSpec::precision(3));
    out.close();

    // 2) read it back and verify
    let mut input = vol.open("/notes/sensor.txt", Mode::Read);
    let mut content = Vec::new();
    while input.available() {
        let mut buf = [0u8; 64];
        let n = input.read(&mut buf);
        if n == 0 {
            break;
        }
        content.extend_from_slice(&buf[..n]);
    }
    if content != b"reading: 42\n3.142\n" {
        bail!("read-back mismatch: {:?}", String::from_utf8_lossy(&content));
    }

    // 3) the listing sees the file, with parents auto-created
    let files = vol.list_files();
    if !files.iter().any(|f| f == "/notes/sensor.txt") {
        bail!("listing is missing /notes/sensor.txt: {files:?}");
    }

    if !vol.remove("/notes") {
        bail!("cleanup of /notes failed");
    }
    Ok(())
}
