//! The `-vf` filter graph applied to every extracted frame.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::probe::ProbeResult;

/// Scales anamorphic sources so that displayed pixels are square.
pub const ANAMORPHIC_CORRECTION: &str = "scale='max(sar,1)*iw':'max(1/sar,1)*ih'";

/// Tone maps PQ material to 8-bit BT.709 4:2:0.
///
/// Linearise at a 100 nit peak, work in planar float RGB, apply Hable with
/// desaturation off, then return to the BT.709 transfer and matrix in
/// limited range.
pub const HDR_TONEMAP_CHAIN: &str = "zscale=t=linear:npl=100,format=gbrpf32le,zscale=p=bt709,tonemap=tonemap=hable:desat=0,zscale=t=bt709:m=bt709:r=tv,format=yuv420p";

/// A built filter graph.
///
/// Built once after probing and reused unchanged for every attempt.
///
/// # Example
///
/// ```
/// use stillpick::{FilterGraph, ProbeResult};
///
/// let probe = ProbeResult { duration_seconds: Some(60), is_hdr: true };
/// let graph = FilterGraph::for_probe(&probe);
/// assert!(graph.is_tone_mapped());
/// assert!(graph.as_str().starts_with("scale="));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    graph: String,
    tone_mapped: bool,
}

impl FilterGraph {
    /// Build the graph, appending the tone-mapping chain when `hdr` is set.
    pub fn new(hdr: bool) -> Self {
        let mut graph = String::from(ANAMORPHIC_CORRECTION);
        if hdr {
            graph.push(',');
            graph.push_str(HDR_TONEMAP_CHAIN);
        }
        Self {
            graph,
            tone_mapped: hdr,
        }
    }

    /// Build the graph for what a probe found.
    pub fn for_probe(probe: &ProbeResult) -> Self {
        Self::new(probe.is_hdr)
    }

    /// The graph as passed to `-vf`.
    pub fn as_str(&self) -> &str {
        &self.graph
    }

    /// Returns `true` if the graph includes the HDR tone-mapping chain.
    pub fn is_tone_mapped(&self) -> bool {
        self.tone_mapped
    }
}

impl Display for FilterGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdr_graph_is_only_aspect_correction() {
        let graph = FilterGraph::new(false);
        assert_eq!(graph.as_str(), ANAMORPHIC_CORRECTION);
        assert!(!graph.as_str().contains("tonemap"));
        assert!(!graph.is_tone_mapped());
    }

    #[test]
    fn hdr_graph_appends_chain_after_correction() {
        let graph = FilterGraph::new(true);
        assert_eq!(
            graph.as_str(),
            format!("{ANAMORPHIC_CORRECTION},{HDR_TONEMAP_CHAIN}")
        );
        let correction = graph.as_str().find("scale='max(sar,1)").unwrap();
        let tonemap = graph.as_str().find("tonemap=hable").unwrap();
        assert!(correction < tonemap);
    }

    #[test]
    fn tonemap_chain_fixes_peak_and_desaturation() {
        assert!(HDR_TONEMAP_CHAIN.contains("npl=100"));
        assert!(HDR_TONEMAP_CHAIN.contains("desat=0"));
        assert!(HDR_TONEMAP_CHAIN.ends_with("format=yuv420p"));
    }
}
