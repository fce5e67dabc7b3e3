//! Persisted form of a trained filter.
//!
//! The document carries the filter and both of its accumulated parts, each
//! flattened row-major into parallel `real`/`imag` sequences:
//!
//! ```json
//! { "width": 32, "height": 32,
//!   "real": [...], "imag": [...],
//!   "top": { "real": [...], "imag": [...] },
//!   "bottom": { "real": [...], "imag": [...] } }
//! ```
//!
//! Trackers that load filters as scripts get the same document assigned to
//! a variable: `var face_filter = {...};`. Non-finite bins are written there
//! as the script literals `NaN`, `Infinity` and `-Infinity`. Plain JSON has
//! no such literals, so the `.json` form writes them as `null`, which reads
//! back as NaN.

use ndarray::Array2;
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_VARIABLE: &str = "face_filter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexParts {
    #[serde(deserialize_with = "nullable")]
    pub real: Vec<f64>,
    #[serde(deserialize_with = "nullable")]
    pub imag: Vec<f64>,
}

impl ComplexParts {
    fn from_array(values: &Array2<Complex64>) -> Self {
        let real = values.iter(/**/).map(|v| v.re).collect(/**/);
        let imag = values.iter(/**/).map(|v| v.im).collect(/**/);
        Self { real, imag }
    }

    fn to_array(&self, width: usize, height: usize) -> Result<Array2<Complex64>> {
        let len = width * height;
        if self.real.len(/**/) != len || self.imag.len(/**/) != len {
            return Err(Error::InvalidAsset(format!(
                "expected {len} values, found {} real and {} imaginary",
                self.real.len(/**/),
                self.imag.len(/**/)
            )));
        }

        let values = self.real.iter(/**/)
            .zip(self.imag.iter(/**/))
            .map(|(&re, &im)| Complex64::new(re, im))
            .collect(/**/);

        Array2::from_shape_vec((height, width), values)
            .map_err(|e| Error::InvalidAsset(e.to_string(/**/)))
    }
}

/// Filter spectrum with the numerator and denominator it was divided from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAsset {
    pub width: usize,
    pub height: usize,
    #[serde(deserialize_with = "nullable")]
    pub real: Vec<f64>,
    #[serde(deserialize_with = "nullable")]
    pub imag: Vec<f64>,
    pub top: ComplexParts,
    pub bottom: ComplexParts,
}

/// Textual wrapper around the JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetFormat {
    Json,
    Script { variable: String },
}

impl AssetFormat {
    /// Scripts for `.js` paths, plain JSON otherwise.
    pub fn for_path(path: &Path, variable: &str) -> Self {
        let is_script = path
            .extension(/**/)
            .and_then(|e| e.to_str(/**/))
            .is_some_and(|e| e.eq_ignore_ascii_case("js"));

        if is_script {
            Self::Script { variable: variable.to_string(/**/) }
        } else {
            Self::Json
        }
    }
}

impl FilterAsset {
    pub fn from_parts(
        filter: &Array2<Complex64>,
        top: &Array2<Complex64>,
        bottom: &Array2<Complex64>,
    ) -> Result<Self> {
        let (height, width) = filter.dim(/**/);
        for part in [top, bottom] {
            if part.dim(/**/) != (height, width) {
                return Err(Error::ShapeMismatch { expected: (height, width), actual: part.dim(/**/) });
            }
        }

        let ComplexParts { real, imag } = ComplexParts::from_array(filter);
        let top = ComplexParts::from_array(top);
        let bottom = ComplexParts::from_array(bottom);
        Ok(Self { width, height, real, imag, top, bottom })
    }

    pub fn filter(&self) -> Result<Array2<Complex64>> {
        let parts = ComplexParts { real: self.real.clone(/**/), imag: self.imag.clone(/**/) };
        parts.to_array(self.width, self.height)
    }

    pub fn numerator(&self) -> Result<Array2<Complex64>> {
        self.top.to_array(self.width, self.height)
    }

    pub fn denominator(&self) -> Result<Array2<Complex64>> {
        self.bottom.to_array(self.width, self.height)
    }

    /// Checks every sequence against `width * height`.
    pub fn validate(&self) -> Result<()> {
        self.filter(/**/)?;
        self.numerator(/**/)?;
        self.denominator(/**/)?;
        Ok(())
    }

    pub fn render(&self, format: &AssetFormat) -> Result<String> {
        let text = match format {
            AssetFormat::Json => serde_json::to_string(self)?,
            AssetFormat::Script { variable } => format!("var {variable} = {};\n", self.script_body(/**/)?),
        };
        Ok(text)
    }

    // Same layout serde writes, with script literals for non-finite values
    fn script_body(&self) -> Result<String> {
        let mut out = String::with_capacity(64 * self.real.len(/**/));
        let _ = write!(out, "{{\"width\":{},\"height\":{},\"real\":", self.width, self.height);
        push_floats(&mut out, &self.real)?;
        out.push_str(",\"imag\":");
        push_floats(&mut out, &self.imag)?;
        for (key, parts) in [("top", &self.top), ("bottom", &self.bottom)] {
            let _ = write!(out, ",\"{key}\":{{\"real\":");
            push_floats(&mut out, &parts.real)?;
            out.push_str(",\"imag\":");
            push_floats(&mut out, &parts.imag)?;
            out.push('}');
        }
        out.push('}');
        Ok(out)
    }

    pub fn save(&self, path: &Path, format: &AssetFormat) -> Result<()> {
        let text = self.render(format)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Parses either plain JSON or a `var name = {...};` script.
    pub fn parse(text: &str) -> Result<Self> {
        let body = text.trim(/**/);
        let body = match body.strip_prefix("var ") {
            Some(rest) => {
                let start = rest.find('=').ok_or_else(|| {
                    Error::InvalidAsset("script wrapper has no assignment".to_string(/**/))
                })?;
                rest[start + 1..].trim(/**/).trim_end_matches(';')
            }
            None => body,
        };

        // Script literals become strings the float reader understands
        let body = body
            .replace("-Infinity", "\"-inf\"")
            .replace("Infinity", "\"inf\"")
            .replace("NaN", "\"nan\"");

        let asset: Self = serde_json::from_str(&body)?;
        asset.validate(/**/)?;
        Ok(asset)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

fn push_floats(out: &mut String, values: &[f64]) -> Result<()> {
    out.push('[');
    for (i, &v) in values.iter(/**/).enumerate(/**/) {
        if i > 0 {
            out.push(',');
        }
        if v.is_nan(/**/) {
            out.push_str("NaN");
        } else if v == f64::INFINITY {
            out.push_str("Infinity");
        } else if v == f64::NEG_INFINITY {
            out.push_str("-Infinity");
        } else {
            out.push_str(&serde_json::to_string(&v)?);
        }
    }
    out.push(']');
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Float {
    Number(f64),
    Literal(String),
}

// null comes from plain JSON, literals from scripts
fn nullable<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Option<Float>>::deserialize(deserializer)?;
    values.into_iter(/**/).map(|v| match v {
        None => Ok(f64::NAN),
        Some(Float::Number(x)) => Ok(x),
        Some(Float::Literal(s)) => match s.as_str(/**/) {
            "nan" => Ok(f64::NAN),
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => Err(serde::de::Error::custom(format!("unexpected value {other:?}"))),
        },
    }).collect(/**/)
}
