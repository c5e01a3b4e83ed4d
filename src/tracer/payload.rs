//! Execution-trace payloads handed to the sampler by the model engine.
//!
//! The sampler never interprets a payload; it only asks for its bytes.

use serde::{Deserialize, Serialize};

use super::TraceError;

/// Anything the engine can hand over as one step's execution trace.
pub trait TracePayload {
    /// Encode the payload into the bytes written to the timeline file.
    fn encode(&self) -> Result<Vec<u8>, TraceError>;
}

impl TracePayload for [u8] {
    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        Ok(self.to_vec())
    }
}

impl TracePayload for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        Ok(self.clone())
    }
}

/// Execution statistics of a single graph node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeExecStats {
    pub node_name: String,
    pub all_start_micros: i64,
    pub all_end_rel_micros: i64,
    pub output_bytes: u64,
}

/// Per-device node statistics for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStepStats {
    pub device: String,
    pub node_stats: Vec<NodeExecStats>,
}

/// Step statistics across all devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub dev_stats: Vec<DeviceStepStats>,
}

impl StepStats {
    /// Total number of node records across devices.
    pub fn node_count(&self) -> usize {
        self.dev_stats.iter().map(|d| d.node_stats.len()).sum()
    }
}

impl TracePayload for StepStats {
    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Metadata returned by a fully traced model run.
///
/// Only the step statistics are persisted to the timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub step_stats: StepStats,
}

impl TracePayload for RunMetadata {
    fn encode(&self) -> Result<Vec<u8>, TraceError> {
        self.step_stats.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> StepStats {
        StepStats {
            dev_stats: vec![DeviceStepStats {
                device: "/device:CPU:0".to_string(),
                node_stats: vec![
                    NodeExecStats {
                        node_name: "matmul".to_string(),
                        all_start_micros: 100,
                        all_end_rel_micros: 42,
                        output_bytes: 4096,
                    },
                    NodeExecStats {
                        node_name: "softmax".to_string(),
                        all_start_micros: 142,
                        all_end_rel_micros: 3,
                        output_bytes: 1024,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_raw_bytes_written_verbatim() {
        let raw = vec![0u8, 1, 2, 255];
        assert_eq!(raw.encode().unwrap(), raw);
        assert_eq!(raw.as_slice().encode().unwrap(), raw);
    }

    #[test]
    fn test_run_metadata_encodes_only_step_stats() {
        let meta = RunMetadata { step_stats: sample_stats() };
        let bytes = meta.encode().unwrap();
        let decoded: StepStats = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, sample_stats());
    }

    #[test]
    fn test_node_count_spans_devices() {
        let mut stats = sample_stats();
        stats.dev_stats.push(DeviceStepStats {
            device: "/device:GPU:0".to_string(),
            node_stats: vec![NodeExecStats::default()],
        });
        assert_eq!(stats.node_count(), 3);
    }
}
