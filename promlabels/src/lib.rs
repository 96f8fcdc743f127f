mod builder;
mod codec;
mod labels;

pub use {
    builder::Builder,
    labels::{Label, Labels, ALERT_NAME, BUCKET_LABEL, INSTANCE_NAME, METRIC_NAME},
};
