//! Dashboard page rendering.
//!
//! Templates use `{name}` placeholders; `{{` and `}}` stand for literal
//! braces so inline CSS and JavaScript survive substitution.

use core::cell::RefCell;
use core::fmt::Display;
use std::io;

use log::debug;

use crate::error::RenderError;
use crate::history::HistoryBuffer;
use crate::state::{ActuatorState, AirQuality, ClimateReading, Co2Band};

/// Placeholders every dashboard template is expected to use.
pub const PLACEHOLDERS: [&str; 9] = [
    "state",
    "nstate",
    "cpu_temperature",
    "co2",
    "tvoc",
    "co2_level",
    "temperature",
    "humidity",
    "plot_data",
];

/// Rendered for readings that are not available.
const MISSING: &str = "None";

pub trait TemplateSource {
    fn load(&self) -> io::Result<String>;
}

/// Template compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct StaticTemplate(pub &'static str);

impl TemplateSource for StaticTemplate {
    fn load(&self) -> io::Result<String> {
        Ok(self.0.to_string())
    }
}

impl<T: TemplateSource + ?Sized> TemplateSource for Box<T> {
    fn load(&self) -> io::Result<String> {
        (**self).load()
    }
}

/// Everything shown on the dashboard at one instant.
#[derive(Debug, Clone, Copy)]
pub struct PageState<'a> {
    pub actuator: ActuatorState,
    pub cpu_temperature: Option<f32>,
    pub air: Option<AirQuality>,
    pub band: Option<Co2Band>,
    pub climate: Option<ClimateReading>,
    pub history: &'a HistoryBuffer,
}

impl PageState<'_> {
    fn value(&self, name: &str) -> Option<String> {
        let value = match name {
            "state" => self.actuator.label().to_string(),
            "nstate" => self.actuator.toggle_label().to_string(),
            "cpu_temperature" => or_missing(self.cpu_temperature.map(|t| format!("{t:.1}"))),
            "co2" => or_missing(self.air.map(|a| a.co2)),
            "tvoc" => or_missing(self.air.map(|a| a.tvoc)),
            "co2_level" => or_missing(self.band),
            "temperature" => or_missing(self.climate.map(|c| c.temperature)),
            "humidity" => or_missing(self.climate.map(|c| c.humidity)),
            "plot_data" => self.history.serialize(),
            _ => return None,
        };
        Some(value)
    }
}

fn or_missing<T: Display>(value: Option<T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => MISSING.to_string(),
    }
}

pub fn render(state: &PageState<'_>, source: &dyn TemplateSource) -> Result<String, RenderError> {
    let template = source.load().map_err(RenderError::TemplateUnavailable)?;
    let page = substitute(&template, |name| state.value(name))?;
    debug!("Rendered page of {} bytes", page.len());
    Ok(page)
}

/// Replace every `{name}` in `template` with `lookup(name)`.
pub fn substitute(
    template: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, RenderError> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                output.push('{');
            }
            '{' => {
                let start = offset + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some((_, '{')) | None => return Err(RenderError::UnbalancedBrace(offset)),
                        Some(_) => {}
                    }
                };
                let name = &template[start..end];
                let value =
                    lookup(name).ok_or_else(|| RenderError::UnknownPlaceholder(name.to_string()))?;
                output.push_str(&value);
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                output.push('}');
            }
            '}' => return Err(RenderError::UnbalancedBrace(offset)),
            c => output.push(c),
        }
    }

    Ok(output)
}

/// Expected placeholders that `template` never uses.
pub fn missing_placeholders(template: &str) -> Vec<&'static str> {
    let used = RefCell::new(Vec::new());
    let _ = substitute(template, |name| {
        used.borrow_mut().push(name.to_string());
        Some(String::new())
    });
    let used = used.into_inner();

    PLACEHOLDERS
        .iter()
        .copied()
        .filter(|name| !used.iter().any(|u| u == name))
        .collect()
}
