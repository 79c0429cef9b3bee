//! Region composition and the disjointness pass.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::map::{HardProcessorMap, MemoryWindow};
use crate::region::{AccessMode, MemoryRegion};

/// Default flash region length.
pub const DEFAULT_FLASH_SIZE: u64 = 0x4_0000;

/// Requested region sizes. `None` omits the region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegionRequest {
    pub ram_size: u64,
    pub rom_size: Option<u64>,
    pub flash_size: Option<u64>,
}

impl RegionRequest {
    /// Full RAM and ROM windows plus the default flash region.
    pub fn full(map: &HardProcessorMap) -> Self {
        Self {
            ram_size: map.ram.size,
            rom_size: Some(map.rom.size),
            flash_size: Some(DEFAULT_FLASH_SIZE),
        }
    }
}

fn place(name: &str, window: &MemoryWindow, size: u64, mode: AccessMode) -> Result<MemoryRegion> {
    if size == 0 {
        return Err(MemoryError::ZeroSize {
            region: name.into(),
        });
    }
    if size > window.size {
        return Err(MemoryError::RegionExceedsWindow {
            region: name.into(),
            requested: size,
            window: window.size,
        });
    }
    Ok(MemoryRegion::new(name, window.origin, size, mode))
}

/// Compose the region set for a build.
///
/// Without hard-processor integration the set is empty; on-chip block RAM is
/// supplied elsewhere. Otherwise: `sram` at the RAM window, `rom` (linker
/// visible) at the ROM window and `flash` (rwx) at the flash window, then one
/// disjointness pass over the result.
pub fn compose_regions(
    map: &HardProcessorMap,
    hard_processor: bool,
    request: &RegionRequest,
) -> Result<Vec<MemoryRegion>> {
    if !hard_processor {
        debug!("memory: no hard processor, empty region set");
        return Ok(Vec::new());
    }

    let mut regions = vec![place("sram", &map.ram, request.ram_size, AccessMode::RW)?];
    if let Some(size) = request.rom_size {
        regions.push(place("rom", &map.rom, size, AccessMode::RX)?.linker_visible());
    }
    if let Some(size) = request.flash_size {
        regions.push(place("flash", &map.flash, size, AccessMode::RWX)?);
    }
    for r in &regions {
        debug!("memory: {r}");
    }

    validate_disjoint(&regions)?;
    Ok(regions)
}

/// Check that names are unique, no region wraps, and no two regions overlap.
pub fn validate_disjoint(regions: &[MemoryRegion]) -> Result<()> {
    for r in regions {
        if r.end().is_none() {
            return Err(MemoryError::AddressOverflow {
                region: r.name.clone(),
            });
        }
    }
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            if a.name == b.name {
                return Err(MemoryError::DuplicateRegion {
                    name: a.name.clone(),
                });
            }
            if a.overlaps(b) {
                return Err(MemoryError::Overlap {
                    a: a.name.clone(),
                    a_start: a.origin,
                    a_end: a.origin + a.size,
                    b: b.name.clone(),
                    b_start: b.origin,
                    b_end: b.origin + b.size,
                });
            }
        }
    }
    Ok(())
}
