//! ITK-SNAP label descriptions.
//!
//! Each object in a volume gets one line:
//!
//! ```text
//! IDX R G B A VIS MSH "LABEL"
//! ```
//!
//! `IDX` is the voxel value, `R G B` are 0..255, `A` is opacity in 0..1,
//! `VIS`/`MSH` are 0/1 flags for label and mesh visibility.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::identity::GlobalIdentity;
use crate::darwin::GlobalId;
use crate::error::LabelvoxError;

/// An 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The nine-colour qualitative "Set1" palette.
pub const PALETTE: [Rgb; 9] = [
    Rgb::new(228, 26, 28),
    Rgb::new(55, 126, 184),
    Rgb::new(77, 175, 74),
    Rgb::new(152, 78, 163),
    Rgb::new(255, 127, 0),
    Rgb::new(255, 255, 51),
    Rgb::new(166, 86, 40),
    Rgb::new(247, 129, 191),
    Rgb::new(153, 153, 153),
];

/// Deterministic colour for a label, cycling through [`PALETTE`].
pub fn palette_color(id: GlobalId) -> Rgb {
    PALETTE[id.as_u32() as usize % PALETTE.len()]
}

/// Display settings shared by every legend line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegendStyle {
    /// Label opacity in `0..=1`.
    pub alpha: f64,
    pub visible: bool,
    pub mesh_visible: bool,
}

impl Default for LegendStyle {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            visible: true,
            mesh_visible: true,
        }
    }
}

/// One legend line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub index: u32,
    pub color: Rgb,
    pub alpha: f64,
    pub visible: bool,
    pub mesh_visible: bool,
    pub name: String,
}

impl LegendEntry {
    /// Formats the entry as an ITK-SNAP line (without trailing newline).
    ///
    /// Double quotes inside the name would end the quoted field early, so
    /// they are replaced with single quotes.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {} {} {} \"{}\"",
            self.index,
            self.color.r,
            self.color.g,
            self.color.b,
            self.alpha,
            u8::from(self.visible),
            u8::from(self.mesh_visible),
            self.name.replace('"', "'")
        )
    }
}

/// The label description for one volume, ordered by label.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Legend {
    entries: Vec<LegendEntry>,
}

impl Legend {
    /// Builds a legend from identities, sorted by label.
    pub fn from_identities<'a, I>(identities: I, style: &LegendStyle) -> Self
    where
        I: IntoIterator<Item = &'a GlobalIdentity>,
    {
        let mut entries: Vec<LegendEntry> = identities
            .into_iter()
            .map(|identity| LegendEntry {
                index: identity.id.as_u32(),
                color: identity.color,
                alpha: style.alpha.clamp(0.0, 1.0),
                visible: style.visible,
                mesh_visible: style.mesh_visible,
                name: identity.name.clone(),
            })
            .collect();
        entries.sort_by_key(|e| e.index);
        Self { entries }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry.to_line())?;
        }
        writer.flush()
    }

    pub fn to_label_string(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.to_line() + "\n")
            .collect()
    }
}

/// Writes a legend to an ITK-SNAP `.label` file.
pub fn write_legend(path: &Path, legend: &Legend) -> Result<(), LabelvoxError> {
    let file = File::create(path).map_err(LabelvoxError::Io)?;
    legend.write_to(BufWriter::new(file)).map_err(LabelvoxError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darwin::AnnotationId;

    fn identity(id: u32, name: &str) -> GlobalIdentity {
        GlobalIdentity::new(GlobalId(id), AnnotationId::new(format!("ann-{id}")), name)
    }

    #[test]
    fn palette_cycles_by_label() {
        assert_eq!(palette_color(GlobalId(1)), Rgb::new(55, 126, 184));
        assert_eq!(palette_color(GlobalId(9)), PALETTE[0]);
        assert_eq!(palette_color(GlobalId(10)), palette_color(GlobalId(1)));
    }

    #[test]
    fn lines_use_itk_snap_layout() {
        let legend = Legend::from_identities(
            &[identity(2, "Lesion"), identity(1, "Liver")],
            &LegendStyle::default(),
        );
        assert_eq!(
            legend.to_label_string(),
            "1 55 126 184 1 1 1 \"Liver\"\n2 77 175 74 1 1 1 \"Lesion\"\n"
        );
    }

    #[test]
    fn style_and_quotes_are_applied() {
        let style = LegendStyle {
            alpha: 0.5,
            visible: true,
            mesh_visible: false,
        };
        let legend = Legend::from_identities(&[identity(3, "the \"big\" one")], &style);
        assert_eq!(
            legend.entries()[0].to_line(),
            "3 152 78 163 0.5 1 0 \"the 'big' one\""
        );
    }

    #[test]
    fn write_to_matches_string_form() {
        let legend = Legend::from_identities(&[identity(1, "a")], &LegendStyle::default());
        let mut buf = Vec::new();
        legend.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), legend.to_label_string());
    }
}
