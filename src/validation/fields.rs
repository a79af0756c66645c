//! The table of tracked record fields.
//!
//! Every column a front end shows for a record is described once here: its
//! header, how to render the value, and (for tracked fields) the rule that
//! decides whether the value conforms to the batch.

use serde::Serialize;

use super::ValidationContext;
use crate::record::ImageRecord;

/// Decides whether a record's field conforms, given the batch context.
pub type Validator = fn(&ImageRecord, &ValidationContext<'_>) -> bool;

/// A record field, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    Path,
    Dtype,
    Scenes,
    Timepoints,
    Channels,
    Width,
    Height,
    Depth,
    ZStack,
    DimensionOrder,
    PixelSizeX,
    PixelSizeY,
    PixelSizeZ,
    ChannelNames,
}

/// Static description of one field.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub field: Field,
    pub header: &'static str,
    pub display: fn(&ImageRecord) -> String,
    /// `None` for informational fields, which are never flagged.
    pub validator: Option<Validator>,
}

/// All fields, indexed by `Field as usize`.
pub const FIELDS: [FieldDescriptor; 14] = [
    FieldDescriptor {
        field: Field::Path,
        header: "Path",
        display: show_path,
        validator: Some(path_is_valid),
    },
    FieldDescriptor {
        field: Field::Dtype,
        header: "Data type",
        display: show_dtype,
        validator: Some(dtype_is_valid),
    },
    FieldDescriptor {
        field: Field::Scenes,
        header: "Scenes",
        display: show_scenes,
        validator: None,
    },
    FieldDescriptor {
        field: Field::Timepoints,
        header: "Timepoints",
        display: show_timepoints,
        validator: Some(timeseries_is_valid),
    },
    FieldDescriptor {
        field: Field::Channels,
        header: "Channels",
        display: show_channels,
        validator: Some(channels_is_valid),
    },
    FieldDescriptor {
        field: Field::Width,
        header: "Width [px]",
        display: show_width,
        validator: None,
    },
    FieldDescriptor {
        field: Field::Height,
        header: "Height [px]",
        display: show_height,
        validator: None,
    },
    FieldDescriptor {
        field: Field::Depth,
        header: "Depth [px]",
        display: show_depth,
        validator: None,
    },
    FieldDescriptor {
        field: Field::ZStack,
        header: "Z-stack",
        display: show_zstack,
        validator: Some(zstack_is_valid),
    },
    FieldDescriptor {
        field: Field::DimensionOrder,
        header: "Dimension order",
        display: show_dimension_order,
        validator: Some(dimension_order_is_valid),
    },
    FieldDescriptor {
        field: Field::PixelSizeX,
        header: "Pixel size (X)",
        display: show_pixel_size_x,
        validator: Some(pixel_size_x_is_valid),
    },
    FieldDescriptor {
        field: Field::PixelSizeY,
        header: "Pixel size (Y)",
        display: show_pixel_size_y,
        validator: Some(pixel_size_y_is_valid),
    },
    FieldDescriptor {
        field: Field::PixelSizeZ,
        header: "Pixel size (Z)",
        display: show_pixel_size_z,
        validator: Some(pixel_size_z_is_valid),
    },
    FieldDescriptor {
        field: Field::ChannelNames,
        header: "Channel names",
        display: show_channel_names,
        validator: Some(channel_names_is_valid),
    },
];

impl Field {
    /// Every field in display order.
    pub fn all() -> impl Iterator<Item = Field> {
        FIELDS.iter().map(|d| d.field)
    }

    pub fn descriptor(self) -> &'static FieldDescriptor {
        &FIELDS[self as usize]
    }

    pub fn header(self) -> &'static str {
        self.descriptor().header
    }

    /// Renders the field of `record` for display.
    pub fn display(self, record: &ImageRecord) -> String {
        (self.descriptor().display)(record)
    }

    /// True if the field has a conformance rule.
    pub fn is_tracked(self) -> bool {
        self.descriptor().validator.is_some()
    }

    /// Applies the field's rule. Informational fields are always valid.
    pub fn is_valid(self, record: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
        match self.descriptor().validator {
            Some(validator) => validator(record, ctx),
            None => true,
        }
    }
}

fn show_path(r: &ImageRecord) -> String {
    r.path.clone()
}

fn show_dtype(r: &ImageRecord) -> String {
    r.dtype.clone()
}

fn show_scenes(r: &ImageRecord) -> String {
    r.n_scenes.to_string()
}

fn show_timepoints(r: &ImageRecord) -> String {
    r.n_timepoints.to_string()
}

fn show_channels(r: &ImageRecord) -> String {
    r.n_channels.to_string()
}

fn show_width(r: &ImageRecord) -> String {
    r.size_x_px.to_string()
}

fn show_height(r: &ImageRecord) -> String {
    r.size_y_px.to_string()
}

fn show_depth(r: &ImageRecord) -> String {
    r.size_z_px.to_string()
}

fn show_zstack(r: &ImageRecord) -> String {
    let shown = if r.is_zstack() { "yes" } else { "no" };
    shown.to_string()
}

fn show_dimension_order(r: &ImageRecord) -> String {
    r.dimension_order.clone()
}

fn show_pixel_size(key: Option<String>) -> String {
    key.unwrap_or_else(|| "unknown".to_string())
}

fn show_pixel_size_x(r: &ImageRecord) -> String {
    show_pixel_size(r.pixel_size_x_str())
}

fn show_pixel_size_y(r: &ImageRecord) -> String {
    show_pixel_size(r.pixel_size_y_str())
}

fn show_pixel_size_z(r: &ImageRecord) -> String {
    show_pixel_size(r.pixel_size_z_str())
}

fn show_channel_names(r: &ImageRecord) -> String {
    r.channel_names.join(", ")
}

fn path_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    ctx.filter_matches(&r.path) && !ctx.is_duplicate_path(&r.path)
}

fn dtype_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.dtype == ctx.consensus().dtype
}

fn timeseries_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.is_timeseries() == ctx.consensus().is_timeseries
}

fn channels_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.n_channels == ctx.consensus().n_channels
}

fn zstack_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.is_zstack() == ctx.consensus().is_zstack
}

fn dimension_order_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.dimension_order == ctx.consensus().dimension_order
}

fn pixel_size_x_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.pixel_size_x_str() == ctx.consensus().pixel_size_x
}

fn pixel_size_y_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.pixel_size_y_str() == ctx.consensus().pixel_size_y
}

fn pixel_size_z_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.pixel_size_z_str() == ctx.consensus().pixel_size_z
}

fn channel_names_is_valid(r: &ImageRecord, ctx: &ValidationContext<'_>) -> bool {
    r.channel_names == ctx.consensus().channel_names
}
