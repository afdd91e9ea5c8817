//! Drag-drop session.
//!
//! Transient interaction state between the library palette / canvas and the
//! mutation engine. The session never edits the page itself: `drop` turns
//! the payload and the target zone into a [`PageMutation`] that the editor
//! session applies.
//!
//! ```text
//! Idle ──start_drag──▶ Dragging ──hover_target──▶ TargetHovered
//!  ▲                     ▲   ◀──leave_target────────┘
//!  └──── drop / cancel ──┴──────────────────────────────┘
//! ```

use log::debug;
use pb_core::columns::partition;
use pb_core::id::NodeId;
use pb_core::model::{PageDocument, Props};
use pb_core::registry::Registry;
use pb_core::zone::DropZone;

use crate::mutations::PageMutation;

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// A component type from the library; instantiated on drop.
    New { kind: String },
    /// A node already on the page; relocated on drop.
    Existing { id: NodeId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload: DragPayload,
    },
    TargetHovered {
        payload: DragPayload,
        zone: DropZone,
    },
}

/// Single-owner drag state machine.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { payload } | DragState::TargetHovered { payload, .. } => {
                Some(payload)
            }
        }
    }

    /// The zone under the pointer, if any.
    pub fn active_zone(&self) -> Option<&DropZone> {
        match &self.state {
            DragState::TargetHovered { zone, .. } => Some(zone),
            _ => None,
        }
    }

    /// Begin a drag. A drag already in progress is replaced.
    pub fn start_drag(&mut self, payload: DragPayload) {
        debug!("drag: start {payload:?}");
        self.state = DragState::Dragging { payload };
    }

    /// Pointer entered a zone. Ignored when nothing is being dragged.
    pub fn hover_target(&mut self, zone: DropZone) {
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            DragState::Idle => DragState::Idle,
            DragState::Dragging { payload } | DragState::TargetHovered { payload, .. } => {
                DragState::TargetHovered { payload, zone }
            }
        };
    }

    /// Pointer left a zone. Leaving a zone other than the active one (events
    /// can arrive out of order) keeps the active zone.
    pub fn leave_target(&mut self, zone: &DropZone) {
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            DragState::TargetHovered { payload, zone: active } if active == *zone => {
                DragState::Dragging { payload }
            }
            other => other,
        };
    }

    /// Finish the drag on `zone`. Returns the edit to apply (if a payload was
    /// present) and always returns the session to `Idle`.
    pub fn drop(&mut self, zone: &DropZone, page: &PageDocument) -> Option<PageMutation> {
        let payload = match std::mem::take(&mut self.state) {
            DragState::Idle => {
                debug!("drag: drop on {zone} with nothing dragged");
                return None;
            }
            DragState::Dragging { payload } | DragState::TargetHovered { payload, .. } => payload,
        };
        debug!("drag: drop {payload:?} on {zone}");

        let mutation = match (payload, zone) {
            (DragPayload::New { kind }, DropZone::Root { index }) => PageMutation::Add {
                kind,
                index: *index,
                parent_id: None,
                overrides: Props::new(),
            },
            (
                DragPayload::New { kind },
                DropZone::Inside {
                    parent,
                    column: None,
                    index,
                },
            ) => PageMutation::Add {
                kind,
                index: *index,
                parent_id: Some(*parent),
                overrides: Props::new(),
            },
            (
                DragPayload::New { kind },
                DropZone::Inside {
                    parent,
                    column: Some(column),
                    index,
                },
            ) => PageMutation::AddInColumn {
                kind,
                parent_id: *parent,
                column: *column,
                index: *index,
                overrides: Props::new(),
            },
            (DragPayload::Existing { id }, zone) => {
                let loc = page.locate(id)?;
                match zone {
                    DropZone::Root { index } if loc.parent.is_none() => {
                        // The source is removed first, so a downward move
                        // lands one slot earlier.
                        let to = if *index > loc.index { index - 1 } else { *index };
                        PageMutation::Move {
                            from: loc.index,
                            to,
                        }
                    }
                    _ => PageMutation::Reparent {
                        id,
                        parent_id: zone.parent(),
                        column: zone.column(),
                        index: zone.index(),
                    },
                }
            }
        };
        Some(mutation)
    }

    /// Abandon the drag (Escape, or a dragend that missed every zone).
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            debug!("drag: cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Whether `zone` should be offered as a target for the current payload.
    /// Templates only see root zones; a node never sees zones inside itself.
    pub fn zone_visible(&self, zone: &DropZone, page: &PageDocument, registry: &Registry) -> bool {
        match self.payload() {
            None => false,
            Some(DragPayload::New { kind }) => {
                zone.is_root() || !registry.lookup(kind).is_some_and(|s| s.is_template())
            }
            Some(DragPayload::Existing { id }) => match zone.parent() {
                None => true,
                Some(parent) => parent != *id && !page.is_descendant(*id, parent),
            },
        }
    }

    /// Every zone visible for the current payload: root positions, then
    /// positions inside each container in pre-order, per column for
    /// column-containers.
    pub fn drop_zones(&self, page: &PageDocument, registry: &Registry) -> Vec<DropZone> {
        if !self.is_dragging() {
            return Vec::new();
        }
        let mut zones: Vec<DropZone> = (0..=page.nodes.len()).map(DropZone::root).collect();
        for node in page.walk() {
            let Some(children) = node.children.as_deref() else {
                continue;
            };
            match registry.column_count(&node.kind, &node.props) {
                Some(count) => {
                    for (column, members) in partition(children, count).iter().enumerate() {
                        zones.extend(
                            (0..=members.len()).map(|k| DropZone::in_column(node.id, column, k)),
                        );
                    }
                }
                None => {
                    zones.extend((0..=children.len()).map(|i| DropZone::inside(node.id, i)));
                }
            }
        }
        zones.retain(|zone| self.zone_visible(zone, page, registry));
        zones
    }
}
