//! Column layouts of the tracking sheets
//!
//! Indices are zero-based offsets into a row. The defaults describe the
//! production sheets; a config file may override them, after which the
//! layouts are read-only.

use crate::error::{Result, SyncError};
use crate::record::{AnimationPhase, RecordType, RenderPhase};
use serde::{Deserialize, Serialize};

/// Layout of the animation sheet (one status column per phase)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationLayout {
    pub shot: u32,
    pub blocking: u32,
    pub polish: u32,
}

impl Default for AnimationLayout {
    fn default() -> Self {
        Self {
            shot: 2,
            blocking: 15,
            polish: 16,
        }
    }
}

impl AnimationLayout {
    pub fn status_column(&self, phase: AnimationPhase) -> u32 {
        match phase {
            AnimationPhase::Blocking => self.blocking,
            AnimationPhase::Polish => self.polish,
        }
    }
}

/// Assignee, status and date columns of one render phase, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseColumns {
    pub assignee: u32,
    pub status: u32,
    pub date: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderLayout {
    pub shot: u32,
    pub render: PhaseColumns,
    pub comp: PhaseColumns,
}

impl Default for RenderLayout {
    fn default() -> Self {
        Self {
            shot: 2,
            render: PhaseColumns {
                assignee: 8,
                status: 9,
                date: 10,
            },
            comp: PhaseColumns {
                assignee: 13,
                status: 14,
                date: 15,
            },
        }
    }
}

impl RenderLayout {
    pub fn phase(&self, phase: RenderPhase) -> PhaseColumns {
        match phase {
            RenderPhase::Render => self.render,
            RenderPhase::Comp => self.comp,
        }
    }
}

/// Layout of the general sheet, where tasks are listed on rows below their shot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralLayout {
    pub shot: u32,
    pub assignee: u32,
    pub task: u32,
    pub status: u32,
    pub task_type: u32,
    pub description: u32,
}

impl Default for GeneralLayout {
    fn default() -> Self {
        Self {
            shot: 1,
            assignee: 3,
            task: 4,
            status: 5,
            task_type: 6,
            description: 7,
        }
    }
}

/// Layout table for every record type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnLayouts {
    pub animation: AnimationLayout,
    pub render: RenderLayout,
    pub general: GeneralLayout,
}

impl ColumnLayouts {
    /// Column holding the shot code for a record type
    pub fn shot_column(&self, record_type: RecordType) -> u32 {
        match record_type {
            RecordType::Animation => self.animation.shot,
            RecordType::Render => self.render.shot,
            RecordType::General => self.general.shot,
        }
    }

    /// Check that every multi-column write lands on adjacent columns in value order
    pub fn validate(&self) -> Result<()> {
        for (name, phase) in [("render", self.render.render), ("comp", self.render.comp)] {
            expect_contiguous(
                &format!("render.{}", name),
                &[
                    ("assignee", phase.assignee),
                    ("status", phase.status),
                    ("date", phase.date),
                ],
            )?;
        }

        let general = &self.general;
        expect_contiguous(
            "general",
            &[
                ("assignee", general.assignee),
                ("task", general.task),
                ("status", general.status),
                ("task_type", general.task_type),
                ("description", general.description),
            ],
        )?;

        Ok(())
    }
}

fn expect_contiguous(layout: &str, columns: &[(&str, u32)]) -> Result<()> {
    for pair in columns.windows(2) {
        let (prev_name, prev) = pair[0];
        let (name, col) = pair[1];
        if prev.checked_add(1) != Some(col) {
            return Err(SyncError::Config(format!(
                "layout '{}': column '{}' ({}) must directly follow '{}' ({})",
                layout, name, col, prev_name, prev
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layouts_are_valid() {
        let layouts = ColumnLayouts::default();
        assert!(layouts.validate().is_ok());
        assert_eq!(layouts.shot_column(RecordType::Animation), 2);
        assert_eq!(layouts.shot_column(RecordType::General), 1);
        assert_eq!(layouts.animation.status_column(AnimationPhase::Blocking), 15);
        assert_eq!(layouts.render.phase(RenderPhase::Comp).assignee, 13);
    }

    #[test]
    fn test_gap_in_render_phase_is_rejected() {
        let mut layouts = ColumnLayouts::default();
        layouts.render.comp.date = 17;
        let err = layouts.validate().unwrap_err();
        assert!(err.to_string().contains("render.comp"));
    }

    #[test]
    fn test_reordered_general_columns_are_rejected() {
        let mut layouts = ColumnLayouts::default();
        layouts.general.task = 5;
        layouts.general.status = 4;
        assert!(layouts.validate().is_err());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let layouts: ColumnLayouts = toml::from_str(
            r#"
            [animation]
            shot = 1

            [render.comp]
            assignee = 20
            status = 21
            date = 22
            "#,
        )
        .unwrap();

        assert_eq!(layouts.animation.shot, 1);
        assert_eq!(layouts.animation.blocking, 15);
        assert_eq!(layouts.render.comp.date, 22);
        assert_eq!(layouts.render.render.assignee, 8);
        assert_eq!(layouts.general, GeneralLayout::default());
    }
}
