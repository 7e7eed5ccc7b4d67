use serde::Serialize;

/// Local call controls. Only `call_active` is ever reflected on the wire,
/// through `peer-ready`; mic and speaker toggles stay local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallControls {
    pub call_active: bool,
    pub mic_enabled: bool,
    pub speakers_enabled: bool,
}

impl Default for CallControls {
    fn default() -> Self {
        Self {
            call_active: false,
            mic_enabled: true,
            speakers_enabled: true,
        }
    }
}
