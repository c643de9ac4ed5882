//! Statistical feature vectors computed per flow window.

use crate::core::PacketObservation;

/// Vector width the scoring model expects. Slots 0-10 are computed from
/// the window; the remaining 26 stay zero for model compatibility.
pub const FEATURE_DIM: usize = 37;

pub type FeatureVector = [f64; FEATURE_DIM];

/// Compute the feature vector for the live observations of one flow.
///
/// Layout:
/// - 0: duration (max - min timestamp, seconds; 0 with a single packet)
/// - 1: total packets
/// - 2: total bytes
/// - 3: average packet size
/// - 4: max packet size
/// - 5: min packet size
/// - 6: mean inter-arrival time (arrival order, seconds; 0 below 2 packets)
/// - 7-10: SYN / ACK / RST / FIN counts
pub fn extract_features(packets: &[&PacketObservation]) -> FeatureVector {
    let mut fv = [0.0f64; FEATURE_DIM];

    if packets.is_empty() {
        return fv;
    }

    let first_ts = packets
        .iter()
        .map(|p| p.timestamp)
        .min()
        .expect("non-empty window");
    let last_ts = packets
        .iter()
        .map(|p| p.timestamp)
        .max()
        .expect("non-empty window");

    let total_packets = packets.len();
    let total_bytes: u64 = packets.iter().map(|p| p.byte_len as u64).sum();
    let max_pkt = packets.iter().map(|p| p.byte_len).max().unwrap_or(0);
    let min_pkt = packets.iter().map(|p| p.byte_len).min().unwrap_or(0);

    // Mean gap between consecutive arrivals, in arrival order.
    let avg_inter = if total_packets >= 2 {
        let total_gap: f64 = packets
            .windows(2)
            .map(|w| duration_secs(w[0].timestamp, w[1].timestamp))
            .sum();
        total_gap / (total_packets - 1) as f64
    } else {
        0.0
    };

    let mut syn = 0u32;
    let mut ack = 0u32;
    let mut rst = 0u32;
    let mut fin = 0u32;
    for p in packets {
        if let Some(flags) = p.tcp_flags {
            if flags.syn { syn += 1; }
            if flags.ack { ack += 1; }
            if flags.rst { rst += 1; }
            if flags.fin { fin += 1; }
        }
    }

    fv[0] = duration_secs(first_ts, last_ts);
    fv[1] = total_packets as f64;
    fv[2] = total_bytes as f64;
    fv[3] = total_bytes as f64 / total_packets as f64;
    fv[4] = max_pkt as f64;
    fv[5] = min_pkt as f64;
    fv[6] = avg_inter;
    fv[7] = syn as f64;
    fv[8] = ack as f64;
    fv[9] = rst as f64;
    fv[10] = fin as f64;

    fv
}

fn duration_secs(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
    (to - from).num_microseconds().unwrap_or(0) as f64 / 1_000_000.0
}
