//! Module trait and the fixed port set every module owns

use serde_json::Value;

use crate::{BlError, BlResult, Input, Light, Output, Param, ParamConfig, PortId, PortInfo};

/// Per-frame timing handed to `Module::process`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessArgs {
    pub sample_rate: f32,
    pub sample_time: f32,
    pub frame: u64,
}

impl ProcessArgs {
    pub fn new(sample_rate: f32) -> BlResult<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(BlError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
            frame: 0,
        })
    }

    /// Same timing, next frame index
    #[inline]
    pub fn advance(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}

impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            sample_time: 1.0 / 48000.0,
            frame: 0,
        }
    }
}

/// Fixed set of params, inputs, outputs, and lights, sized at construction
#[derive(Debug, Clone, Default)]
pub struct ModuleIo {
    params: Vec<Param>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    lights: Vec<Light>,
}

impl ModuleIo {
    pub fn new(params: usize, inputs: usize, outputs: usize, lights: usize) -> Self {
        Self {
            params: vec![Param::default(); params],
            inputs: vec![Input::default(); inputs],
            outputs: vec![Output::default(); outputs],
            lights: vec![Light::default(); lights],
        }
    }

    /// Sized from the id enums of a module
    pub fn for_ids<P: PortId, I: PortId, O: PortId, L: PortId>() -> Self {
        Self::new(P::COUNT, I::COUNT, O::COUNT, L::COUNT)
    }

    // ─── Configuration ────────────────────────────────────────────────────

    pub fn config_param(&mut self, id: impl PortId, config: ParamConfig) -> &mut Param {
        let slot = &mut self.params[id.index()];
        *slot = Param::new(config);
        slot
    }

    pub fn config_switch(
        &mut self,
        id: impl PortId,
        name: &str,
        default: f32,
        labels: &[&str],
    ) -> &mut Param {
        let max = labels.len().saturating_sub(1) as f32;
        self.config_param(id, ParamConfig::switch(name, 0.0, max, default, labels))
    }

    pub fn config_button(&mut self, id: impl PortId, name: &str) -> &mut Param {
        self.config_param(id, ParamConfig::button(name))
    }

    pub fn config_input(&mut self, id: impl PortId, name: &str, description: &str) {
        self.inputs[id.index()] = Input::new(PortInfo {
            name: name.to_string(),
            description: description.to_string(),
        });
    }

    pub fn config_output(&mut self, id: impl PortId, name: &str, description: &str) {
        self.outputs[id.index()] = Output::new(PortInfo {
            name: name.to_string(),
            description: description.to_string(),
        });
    }

    pub fn config_light(&mut self, id: impl PortId, name: &str) {
        self.lights[id.index()] = Light::new(name);
    }

    // ─── Access ───────────────────────────────────────────────────────────

    #[inline]
    pub fn param(&self, id: impl PortId) -> &Param {
        &self.params[id.index()]
    }

    #[inline]
    pub fn param_mut(&mut self, id: impl PortId) -> &mut Param {
        &mut self.params[id.index()]
    }

    /// Shorthand for the current value of a param
    #[inline]
    pub fn value(&self, id: impl PortId) -> f32 {
        self.params[id.index()].value()
    }

    #[inline]
    pub fn set_value(&mut self, id: impl PortId, value: f32) {
        self.params[id.index()].set_value(value);
    }

    #[inline]
    pub fn input(&self, id: impl PortId) -> &Input {
        &self.inputs[id.index()]
    }

    #[inline]
    pub fn input_mut(&mut self, id: impl PortId) -> &mut Input {
        &mut self.inputs[id.index()]
    }

    #[inline]
    pub fn output(&self, id: impl PortId) -> &Output {
        &self.outputs[id.index()]
    }

    #[inline]
    pub fn output_mut(&mut self, id: impl PortId) -> &mut Output {
        &mut self.outputs[id.index()]
    }

    #[inline]
    pub fn light(&self, id: impl PortId) -> &Light {
        &self.lights[id.index()]
    }

    #[inline]
    pub fn light_mut(&mut self, id: impl PortId) -> &mut Light {
        &mut self.lights[id.index()]
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [Param] {
        &mut self.params
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }
}

/// A processing unit driven by the host transport.
///
/// The host calls `on_sample_rate_change` before the first frame and whenever
/// the rate changes, then either `process` or `process_bypass` once per frame.
pub trait Module {
    /// Stable model identifier used in patch documents
    fn model(&self) -> &'static str;

    fn io(&self) -> &ModuleIo;

    fn io_mut(&mut self) -> &mut ModuleIo;

    fn on_sample_rate_change(&mut self, sample_rate: f32);

    fn process(&mut self, args: &ProcessArgs);

    /// Called instead of `process` while the host has the module disabled
    fn process_bypass(&mut self, _args: &ProcessArgs) {}

    /// Module-specific state beyond param values
    fn data_to_json(&self) -> Value {
        Value::Null
    }

    /// Restore module-specific state; missing or malformed keys keep defaults
    fn data_from_json(&mut self, _root: &Value) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::port_ids! {
        enum TestParam { Gain, Mode }
    }
    crate::port_ids! {
        enum TestInput { In }
    }
    crate::port_ids! {
        enum TestOutput { Out }
    }
    crate::port_ids! {
        enum TestLight { Led }
    }

    #[test]
    fn test_process_args_validation() {
        assert!(ProcessArgs::new(0.0).is_err());
        assert!(ProcessArgs::new(-44100.0).is_err());
        assert!(ProcessArgs::new(f32::NAN).is_err());
        let args = ProcessArgs::new(44100.0).unwrap();
        assert!((args.sample_time - 1.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    fn test_module_io_config() {
        let mut io = ModuleIo::for_ids::<TestParam, TestInput, TestOutput, TestLight>();
        io.config_param(TestParam::Gain, ParamConfig::continuous("Gain", 0.0, 1.0, 0.75));
        io.config_switch(TestParam::Mode, "Mode", 0.0, &["A", "B", "C"]);
        io.config_input(TestInput::In, "In", "");
        io.config_output(TestOutput::Out, "Out", "Normalled to nothing");
        io.config_light(TestLight::Led, "Led");

        assert_eq!(io.params().len(), 2);
        assert_eq!(io.value(TestParam::Gain), 0.75);
        io.set_value(TestParam::Mode, 5.0);
        assert_eq!(io.value(TestParam::Mode), 2.0);
        assert_eq!(io.param(TestParam::Mode).display_value(), "C");
        assert_eq!(io.output(TestOutput::Out).info().description, "Normalled to nothing");
        assert_eq!(io.light(TestLight::Led).name(), "Led");
    }
}
