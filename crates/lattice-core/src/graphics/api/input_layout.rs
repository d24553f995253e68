// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vertex input layout description and normalization.
//!
//! A caller describes vertex inputs as a list of [`LayoutElement`]s, leaving
//! offsets and strides to be computed where convenient. [`NormalizedInputLayout`]
//! resolves those placeholders once per pipeline:
//!
//! - an automatic offset is the tightly packed size accumulated so far for the
//!   element's buffer slot, in element order;
//! - a slot's tight stride is the furthest byte any of its elements reaches;
//! - explicit strides in one slot must agree (the first one wins otherwise);
//! - slots without an explicit stride use their tight stride, and explicit
//!   strides smaller than the tight stride are reported;
//! - floating-point elements are never normalized.
//!
//! Problems are reported as [`LayoutDiagnostic`]s and logged. None of them
//! prevents pipeline creation: strides can legitimately include padding, and
//! the layout is kept with best-effort values.

use super::enums::{InputElementFrequency, ValueType};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Number of vertex buffer slots an input layout can address.
pub const MAX_BUFFER_SLOTS: u32 = 32;

/// One vertex shader input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutElement {
    /// Input location in the vertex shader.
    pub input_index: u32,
    /// Vertex buffer slot the element is read from.
    pub buffer_slot: u32,
    /// Number of components, 1 to 4.
    pub num_components: u32,
    /// Component type.
    pub value_type: ValueType,
    /// Whether integer components are normalized to `[0, 1]` / `[-1, 1]`.
    pub is_normalized: bool,
    /// Offset from the start of the vertex. `None` places the element right
    /// after the previous element of the same slot.
    pub relative_offset: Option<u32>,
    /// Distance between two vertices in the slot. `None` uses the tight stride.
    pub stride: Option<u32>,
    /// Per-vertex or per-instance data.
    pub frequency: InputElementFrequency,
    /// Instances drawn before advancing a per-instance element.
    pub instance_data_step_rate: u32,
}

impl LayoutElement {
    /// A per-vertex element with automatic offset and stride.
    pub fn new(
        input_index: u32,
        buffer_slot: u32,
        num_components: u32,
        value_type: ValueType,
    ) -> Self {
        Self {
            input_index,
            buffer_slot,
            num_components,
            value_type,
            is_normalized: true,
            relative_offset: None,
            stride: None,
            frequency: InputElementFrequency::PerVertex,
            instance_data_step_rate: 1,
        }
    }

    /// Sets an explicit relative offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.relative_offset = Some(offset);
        self
    }

    /// Sets an explicit stride.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = Some(stride);
        self
    }

    /// Sets the normalization flag.
    pub fn normalized(mut self, is_normalized: bool) -> Self {
        self.is_normalized = is_normalized;
        self
    }

    /// Makes the element advance per instance.
    pub fn per_instance(mut self, step_rate: u32) -> Self {
        self.frequency = InputElementFrequency::PerInstance;
        self.instance_data_step_rate = step_rate;
        self
    }

    /// Byte size of the element's data.
    pub fn data_size(&self) -> u32 {
        self.num_components.saturating_mul(self.value_type.size())
    }
}

/// An ordered list of vertex inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLayoutDesc<'a> {
    /// The elements, in declaration order.
    pub elements: Cow<'a, [LayoutElement]>,
}

impl<'a> InputLayoutDesc<'a> {
    /// Wraps a slice of elements.
    pub fn new(elements: &'a [LayoutElement]) -> Self {
        Self {
            elements: Cow::Borrowed(elements),
        }
    }
}

/// A layout element with every placeholder resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedLayoutElement {
    /// Input location in the vertex shader.
    pub input_index: u32,
    /// Vertex buffer slot.
    pub buffer_slot: u32,
    /// Number of components.
    pub num_components: u32,
    /// Component type.
    pub value_type: ValueType,
    /// Normalization flag, always `false` for float types.
    pub is_normalized: bool,
    /// Resolved offset.
    pub relative_offset: u32,
    /// Resolved stride.
    pub stride: u32,
    /// Per-vertex or per-instance data.
    pub frequency: InputElementFrequency,
    /// Instance step rate.
    pub instance_data_step_rate: u32,
}

/// A non-fatal problem found while normalizing an input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutDiagnostic {
    /// An element names a slot beyond [`MAX_BUFFER_SLOTS`]. It is ignored for
    /// stride computation.
    BufferSlotOutOfRange {
        /// Input index of the element.
        input_index: u32,
        /// The offending slot.
        buffer_slot: u32,
    },
    /// An element's explicit stride disagrees with an earlier one in its slot.
    InconsistentStride {
        /// The slot.
        buffer_slot: u32,
        /// Input index of the disagreeing element.
        input_index: u32,
        /// The stride the element asks for.
        requested: u32,
        /// The stride kept for the slot.
        current: u32,
    },
    /// An explicit stride cannot hold every element of its slot.
    StrideTooSmall {
        /// The slot.
        buffer_slot: u32,
        /// The explicit stride.
        stride: u32,
        /// The tight stride the elements need.
        minimum: u32,
    },
}

impl fmt::Display for LayoutDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutDiagnostic::BufferSlotOutOfRange {
                input_index,
                buffer_slot,
            } => write!(
                f,
                "Input element {input_index} uses buffer slot {buffer_slot}, which exceeds the maximum allowed value ({})",
                MAX_BUFFER_SLOTS - 1
            ),
            LayoutDiagnostic::InconsistentStride {
                buffer_slot,
                input_index,
                requested,
                current,
            } => write!(
                f,
                "Inconsistent strides are specified for buffer slot {buffer_slot}: input element {input_index} \
                 explicitly specifies stride {requested} while the current value is {current}"
            ),
            LayoutDiagnostic::StrideTooSmall {
                buffer_slot,
                stride,
                minimum,
            } => write!(
                f,
                "Stride {stride} explicitly specified for buffer slot {buffer_slot} is smaller than the \
                 minimum stride {minimum} required to accommodate all input elements"
            ),
        }
    }
}

/// The result of resolving an [`InputLayoutDesc`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedInputLayout {
    elements: Vec<ResolvedLayoutElement>,
    strides: Vec<u32>,
    diagnostics: Vec<LayoutDiagnostic>,
}

impl NormalizedInputLayout {
    /// Resolves offsets and strides of `desc`.
    pub fn normalize(desc: &InputLayoutDesc<'_>) -> Self {
        let slot_count = MAX_BUFFER_SLOTS as usize;
        let mut explicit_strides: [Option<u32>; MAX_BUFFER_SLOTS as usize] = [None; MAX_BUFFER_SLOTS as usize];
        let mut tight_strides = [0u32; MAX_BUFFER_SLOTS as usize];
        let mut slots_used = 0u32;
        let mut diagnostics = Vec::new();
        let mut elements = Vec::with_capacity(desc.elements.len());

        for elem in desc.elements.iter() {
            let slot = elem.buffer_slot as usize;
            let is_normalized = elem.is_normalized && !elem.value_type.is_float();

            if slot >= slot_count {
                let diag = LayoutDiagnostic::BufferSlotOutOfRange {
                    input_index: elem.input_index,
                    buffer_slot: elem.buffer_slot,
                };
                log::error!("{diag}");
                diagnostics.push(diag);
                elements.push(resolve(elem, is_normalized, elem.relative_offset.unwrap_or(0)));
                continue;
            }
            slots_used = slots_used.max(elem.buffer_slot + 1);

            let offset = elem.relative_offset.unwrap_or(tight_strides[slot]);

            if let Some(stride) = elem.stride {
                match explicit_strides[slot] {
                    Some(current) if current != stride => {
                        let diag = LayoutDiagnostic::InconsistentStride {
                            buffer_slot: elem.buffer_slot,
                            input_index: elem.input_index,
                            requested: stride,
                            current,
                        };
                        log::error!("{diag}");
                        diagnostics.push(diag);
                    }
                    Some(_) => {}
                    None => explicit_strides[slot] = Some(stride),
                }
            }

            tight_strides[slot] = tight_strides[slot].max(offset.saturating_add(elem.data_size()));
            elements.push(resolve(elem, is_normalized, offset));
        }

        let mut strides = vec![0u32; slots_used as usize];
        let mut slot_has_elements = [false; MAX_BUFFER_SLOTS as usize];
        for elem in desc.elements.iter() {
            if let Some(used) = slot_has_elements.get_mut(elem.buffer_slot as usize) {
                *used = true;
            }
        }
        for (slot, stride) in strides.iter_mut().enumerate() {
            if !slot_has_elements[slot] {
                continue;
            }
            *stride = match explicit_strides[slot] {
                None => tight_strides[slot],
                Some(explicit) => {
                    if explicit < tight_strides[slot] {
                        let diag = LayoutDiagnostic::StrideTooSmall {
                            buffer_slot: slot as u32,
                            stride: explicit,
                            minimum: tight_strides[slot],
                        };
                        log::error!("{diag}");
                        diagnostics.push(diag);
                    }
                    explicit
                }
            };
        }

        for (resolved, elem) in elements.iter_mut().zip(desc.elements.iter()) {
            resolved.stride = match elem.stride {
                Some(stride) => stride,
                None => strides.get(elem.buffer_slot as usize).copied().unwrap_or(0),
            };
        }

        Self {
            elements,
            strides,
            diagnostics,
        }
    }

    /// The resolved elements, in declaration order.
    pub fn elements(&self) -> &[ResolvedLayoutElement] {
        &self.elements
    }

    /// Stride of `slot`, or `0` if the slot is not used.
    pub fn buffer_stride(&self, slot: u32) -> u32 {
        self.strides.get(slot as usize).copied().unwrap_or(0)
    }

    /// One past the highest slot referenced by an element.
    pub fn num_buffer_slots_used(&self) -> u32 {
        self.strides.len() as u32
    }

    /// Strides of slots `0..num_buffer_slots_used()`. Unused slots are `0`.
    pub fn strides(&self) -> &[u32] {
        &self.strides
    }

    /// Problems found during normalization.
    pub fn diagnostics(&self) -> &[LayoutDiagnostic] {
        &self.diagnostics
    }
}

fn resolve(elem: &LayoutElement, is_normalized: bool, offset: u32) -> ResolvedLayoutElement {
    ResolvedLayoutElement {
        input_index: elem.input_index,
        buffer_slot: elem.buffer_slot,
        num_components: elem.num_components,
        value_type: elem.value_type,
        is_normalized,
        relative_offset: offset,
        stride: elem.stride.unwrap_or(0),
        frequency: elem.frequency,
        instance_data_step_rate: elem.instance_data_step_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(elements: &[LayoutElement]) -> NormalizedInputLayout {
        NormalizedInputLayout::normalize(&InputLayoutDesc::new(elements))
    }

    #[test]
    fn test_empty_layout_uses_no_slots() {
        let layout = normalize(&[]);
        assert_eq!(layout.num_buffer_slots_used(), 0);
        assert_eq!(layout.buffer_stride(0), 0);
        assert!(layout.diagnostics().is_empty());
    }

    #[test]
    fn test_auto_offsets_are_tightly_packed() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 2, ValueType::Float32),
            LayoutElement::new(1, 0, 3, ValueType::Float32),
        ]);
        let offsets: Vec<u32> = layout.elements().iter().map(|e| e.relative_offset).collect();
        assert_eq!(offsets, vec![0, 8]);
        assert_eq!(layout.buffer_stride(0), 20);
        assert!(layout.elements().iter().all(|e| e.stride == 20));
    }

    #[test]
    fn test_tight_stride_is_sum_of_component_sizes_per_slot() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 3, ValueType::Float32),
            LayoutElement::new(1, 1, 4, ValueType::Uint8),
            LayoutElement::new(2, 0, 2, ValueType::Float16),
            LayoutElement::new(3, 1, 2, ValueType::Int16),
        ]);
        assert_eq!(layout.num_buffer_slots_used(), 2);
        assert_eq!(layout.buffer_stride(0), 12 + 4);
        assert_eq!(layout.buffer_stride(1), 4 + 4);

        let slot0: Vec<u32> = layout
            .elements()
            .iter()
            .filter(|e| e.buffer_slot == 0)
            .map(|e| e.relative_offset)
            .collect();
        assert_eq!(slot0, vec![0, 12]);
    }

    #[test]
    fn test_unused_slots_inside_range_have_zero_stride() {
        let layout = normalize(&[LayoutElement::new(0, 2, 4, ValueType::Float32)]);
        assert_eq!(layout.num_buffer_slots_used(), 3);
        assert_eq!(layout.strides(), &[0, 0, 16]);
        assert_eq!(layout.buffer_stride(7), 0);
    }

    #[test]
    fn test_explicit_offset_extends_tight_stride() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 4, ValueType::Uint8).with_offset(16),
            LayoutElement::new(1, 0, 1, ValueType::Float32),
        ]);
        // The auto offset follows the furthest byte reached so far.
        assert_eq!(layout.elements()[1].relative_offset, 20);
        assert_eq!(layout.buffer_stride(0), 24);
    }

    #[test]
    fn test_huge_explicit_offset_saturates() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 4, ValueType::Float32).with_offset(u32::MAX - 2),
        ]);
        assert_eq!(layout.elements()[0].relative_offset, u32::MAX - 2);
        assert_eq!(layout.buffer_stride(0), u32::MAX);
    }

    #[test]
    fn test_explicit_stride_with_padding_is_accepted() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 3, ValueType::Float32).with_stride(32),
            LayoutElement::new(1, 0, 2, ValueType::Float32),
        ]);
        assert_eq!(layout.buffer_stride(0), 32);
        assert!(layout.elements().iter().all(|e| e.stride == 32));
        assert!(layout.diagnostics().is_empty());
    }

    #[test]
    fn test_conflicting_strides_keep_first_and_report() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 2, ValueType::Float32).with_stride(24),
            LayoutElement::new(1, 0, 2, ValueType::Float32).with_stride(32),
            LayoutElement::new(2, 0, 1, ValueType::Float32),
        ]);
        // Tight size is 20, so the kept stride of 24 is large enough.
        assert_eq!(layout.buffer_stride(0), 24);
        assert_eq!(layout.elements()[2].relative_offset, 16);
        assert_eq!(layout.elements()[2].stride, 24);
        assert_eq!(
            layout.diagnostics(),
            &[LayoutDiagnostic::InconsistentStride {
                buffer_slot: 0,
                input_index: 1,
                requested: 32,
                current: 24,
            }]
        );
    }

    #[test]
    fn test_conflicting_too_small_stride_reports_both() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 2, ValueType::Float32).with_stride(16),
            LayoutElement::new(1, 0, 2, ValueType::Float32).with_stride(24),
            LayoutElement::new(2, 0, 1, ValueType::Float32),
        ]);
        assert_eq!(layout.buffer_stride(0), 16);
        assert_eq!(
            layout.diagnostics(),
            &[
                LayoutDiagnostic::InconsistentStride {
                    buffer_slot: 0,
                    input_index: 1,
                    requested: 24,
                    current: 16,
                },
                LayoutDiagnostic::StrideTooSmall {
                    buffer_slot: 0,
                    stride: 16,
                    minimum: 20,
                },
            ]
        );
    }

    #[test]
    fn test_stride_smaller_than_tight_is_reported_once() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 4, ValueType::Float32).with_stride(8),
            LayoutElement::new(1, 0, 4, ValueType::Float32),
        ]);
        assert_eq!(layout.buffer_stride(0), 8);
        assert_eq!(
            layout.diagnostics(),
            &[LayoutDiagnostic::StrideTooSmall {
                buffer_slot: 0,
                stride: 8,
                minimum: 32,
            }]
        );
    }

    #[test]
    fn test_float_elements_are_never_normalized() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 2, ValueType::Float32).normalized(true),
            LayoutElement::new(1, 0, 2, ValueType::Float16).normalized(true),
            LayoutElement::new(2, 0, 4, ValueType::Uint8).normalized(true),
        ]);
        let flags: Vec<bool> = layout.elements().iter().map(|e| e.is_normalized).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_out_of_range_slot_is_skipped() {
        let layout = normalize(&[
            LayoutElement::new(0, 0, 1, ValueType::Float32),
            LayoutElement::new(1, MAX_BUFFER_SLOTS, 4, ValueType::Float32),
        ]);
        assert_eq!(layout.num_buffer_slots_used(), 1);
        assert_eq!(layout.buffer_stride(0), 4);
        assert_eq!(layout.elements().len(), 2);
        assert_eq!(layout.elements()[1].stride, 0);
        assert!(matches!(
            layout.diagnostics(),
            [LayoutDiagnostic::BufferSlotOutOfRange { buffer_slot: 32, .. }]
        ));
    }
}
