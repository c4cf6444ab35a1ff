use super::{PlanExporter, Position3};
use crate::feature_type::FeatureType;

/// Forwards every call to a host communication channel. The channel itself
/// (a socket, a shared-memory ring, a message bus) is out of scope for the
/// core; this exporter only owns the adaptation from tree calls to channel
/// messages.
pub trait HostChannel: Send {
    fn send(&mut self, message: HostMessage);
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    LayerStart {
        layer_index: usize,
        start_position: Position3,
    },
    Extrusion {
        point: Position3,
        speed: f64,
        mm3_per_mm: f64,
        line_width: f64,
        line_thickness: f64,
        feature_type: FeatureType,
    },
    Travel {
        point: Position3,
        speed: f64,
        feature_type: FeatureType,
    },
    LayerEnd {
        layer_index: usize,
        z: f64,
        layer_thickness: f64,
    },
}

pub struct CommunicationExporter {
    channel: Box<dyn HostChannel>,
}

impl CommunicationExporter {
    pub fn new(channel: Box<dyn HostChannel>) -> Self {
        CommunicationExporter { channel }
    }
}

impl PlanExporter for CommunicationExporter {
    fn write_layer_start(&mut self, layer_index: usize, start_position: Position3) {
        self.channel.send(HostMessage::LayerStart {
            layer_index,
            start_position,
        });
    }

    fn write_extrusion(
        &mut self,
        point: Position3,
        speed: f64,
        mm3_per_mm: f64,
        line_width: f64,
        line_thickness: f64,
        feature_type: FeatureType,
        _update_extrusion_offset: bool,
    ) {
        self.channel.send(HostMessage::Extrusion {
            point,
            speed,
            mm3_per_mm,
            line_width,
            line_thickness,
            feature_type,
        });
    }

    fn write_travel(&mut self, point: Position3, speed: f64, feature_type: FeatureType) {
        self.channel.send(HostMessage::Travel {
            point,
            speed,
            feature_type,
        });
    }

    fn write_layer_end(&mut self, layer_index: usize, z: f64, layer_thickness: f64) {
        self.channel.send(HostMessage::LayerEnd {
            layer_index,
            z,
            layer_thickness,
        });
    }
}
