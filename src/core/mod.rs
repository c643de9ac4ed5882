//! Core packet and flow types shared by capture, ingestion and analysis.

pub mod flow;
pub mod packet;

pub use flow::{FlowAddr, FlowKey, PacketObservation, MDNS_PORT};
pub use packet::{IpProtocol, PacketMeta, TcpFlags};
