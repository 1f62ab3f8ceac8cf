//! Hit types for wire readout planes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coarse detector sub-volume (TPC) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TpcId(pub u32);

/// Readout plane within a TPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneId {
    /// Owning TPC.
    pub tpc: TpcId,
    /// Plane index within the TPC.
    pub plane: u32,
}

impl PlaneId {
    /// Creates a new plane identifier.
    #[inline]
    #[must_use]
    pub fn new(tpc: u32, plane: u32) -> Self {
        Self {
            tpc: TpcId(tpc),
            plane,
        }
    }
}

/// Readout channel: a wire on a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireId {
    /// Owning plane.
    pub plane_id: PlaneId,
    /// Wire index, increasing along the plane's wire direction.
    pub wire: u32,
}

impl WireId {
    /// Creates a new wire identifier.
    #[inline]
    #[must_use]
    pub fn new(tpc: u32, plane: u32, wire: u32) -> Self {
        Self {
            plane_id: PlaneId::new(tpc, plane),
            wire,
        }
    }

    /// Returns the TPC of this wire.
    #[inline]
    #[must_use]
    pub fn tpc(&self) -> TpcId {
        self.plane_id.tpc
    }

    /// Returns the plane index of this wire.
    #[inline]
    #[must_use]
    pub fn plane(&self) -> u32 {
        self.plane_id.plane
    }
}

/// Kind of signal a plane produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignalType {
    /// Bipolar induction signal.
    Induction,
    /// Unipolar collection signal.
    #[default]
    Collection,
}

/// Stable identity of a hit within an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitId(pub u64);

/// Identifies a readout snippet: a contiguous pulse on one wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnippetKey {
    /// First tick of the snippet.
    pub start_tick: i32,
    /// Last tick of the snippet.
    pub end_tick: i32,
    /// Wire the snippet was read from.
    pub wire: u32,
}

/// A reconstructed charge pulse on a single wire.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Identity of the hit.
    pub id: HitId,
    /// Readout channel.
    pub wire: WireId,
    /// Signal type of the plane.
    pub signal_type: SignalType,
    /// Snippet start tick.
    pub start_tick: i32,
    /// Snippet end tick.
    pub end_tick: i32,
    /// Peak time in ticks.
    pub peak_time: f64,
    /// Integrated charge (ADC).
    pub integral: f64,
}

impl Hit {
    /// Creates a collection hit with a snippet spanning a single tick
    /// around the peak.
    #[must_use]
    pub fn new(id: u64, wire: WireId, peak_time: f64, integral: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let tick = peak_time.round() as i32;
        Self {
            id: HitId(id),
            wire,
            signal_type: SignalType::Collection,
            start_tick: tick,
            end_tick: tick,
            peak_time,
            integral,
        }
    }

    /// Sets the snippet bounds.
    #[must_use]
    pub fn with_snippet(mut self, start_tick: i32, end_tick: i32) -> Self {
        self.start_tick = start_tick;
        self.end_tick = end_tick;
        self
    }

    /// Sets the signal type.
    #[must_use]
    pub fn with_signal_type(mut self, signal_type: SignalType) -> Self {
        self.signal_type = signal_type;
        self
    }

    /// Returns the plane this hit was read out on.
    #[inline]
    #[must_use]
    pub fn plane_id(&self) -> PlaneId {
        self.wire.plane_id
    }

    /// Returns the key of the readout snippet this hit was found on.
    #[inline]
    #[must_use]
    pub fn snippet_key(&self) -> SnippetKey {
        SnippetKey {
            start_tick: self.start_tick,
            end_tick: self.end_tick,
            wire: self.wire.wire,
        }
    }
}
