use tlm_graph::{Cqs, HydraulicSlot, NodeType, ReadRef, Requirement, SlotRef};

use crate::context::{Configure, Initialize, Output, ReadPort, Step};
use crate::error::ComponentResult;
use crate::traits::{Component, ComponentType};

macro_rules! hydraulic_sensors {
    ($($name:ident => $type_name:literal, $slot:ident, $doc:literal;)*) => {
        $(
            #[doc = $doc]
            #[derive(Debug)]
            pub struct $name {
                p1: ReadPort,
                out: Output,
                refs: Option<(ReadRef, SlotRef)>,
            }

            impl ComponentType for $name {
                const TYPE_NAME: &'static str = $type_name;
                const CQS: Cqs = Cqs::S;
                const DESCRIPTION: &'static str = $doc;

                fn configure(cfg: &mut Configure<'_>) -> Self {
                    Self {
                        p1: cfg.read_port("P1", NodeType::Hydraulic, Requirement::Required),
                        out: cfg.output_variable("out", "Measured value"),
                        refs: None,
                    }
                }
            }

            impl Component for $name {
                fn initialize(&mut self, init: &mut Initialize<'_>) -> ComponentResult<()> {
                    let input = init.read(self.p1, HydraulicSlot::$slot)?;
                    let out = init.output(self.out)?;
                    let value = init.get(input);
                    init.set(out, value);
                    self.refs = Some((input, out));
                    Ok(())
                }

                fn simulate_one_timestep(&mut self, step: &mut Step<'_>) {
                    let Some((input, out)) = self.refs else { return };
                    let value = step.get(input);
                    step.set(out, value);
                }
            }
        )*
    };
}

hydraulic_sensors! {
    PressureSensor => "HydraulicPressureSensor", Pressure, "Pressure sensor";
    FlowSensor => "HydraulicFlowSensor", Flow, "Flow sensor";
}
