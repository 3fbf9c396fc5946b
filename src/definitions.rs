//! Feature vocabulary
//!
//! The fixed set of feature names a dataset may provide. Scalar features hold
//! one number per event and are small enough to download as a whole column;
//! everything else is accessed event by event.

/// Reserved name of the waveform feature
pub const TRACE: &str = "trace";

/// Scalar features and their axis labels
const SCALAR_FEATURES: &[(&str, &str)] = &[
    ("area_cvx", "Convex area [px]"),
    ("area_msd", "Measured area [px]"),
    ("area_ratio", "Convex to measured area ratio"),
    ("area_um", "Area [µm²]"),
    ("aspect", "Aspect ratio of bounding box"),
    ("bright_avg", "Brightness average within contour [a.u.]"),
    ("bright_sd", "Brightness SD within contour [a.u.]"),
    ("circ", "Circularity"),
    ("deform", "Deformation"),
    ("emodulus", "Young's Modulus [kPa]"),
    ("fl1_area", "FL-1 area of peak [a.u.]"),
    ("fl1_dist", "FL-1 distance between two first peaks [µs]"),
    ("fl1_max", "FL-1 maximum [a.u.]"),
    ("fl1_npeaks", "FL-1 number of peaks"),
    ("fl1_pos", "FL-1 position of peak [µs]"),
    ("fl1_width", "FL-1 width [µs]"),
    ("fl2_area", "FL-2 area of peak [a.u.]"),
    ("fl2_dist", "FL-2 distance between two first peaks [µs]"),
    ("fl2_max", "FL-2 maximum [a.u.]"),
    ("fl2_npeaks", "FL-2 number of peaks"),
    ("fl2_pos", "FL-2 position of peak [µs]"),
    ("fl2_width", "FL-2 width [µs]"),
    ("fl3_area", "FL-3 area of peak [a.u.]"),
    ("fl3_dist", "FL-3 distance between two first peaks [µs]"),
    ("fl3_max", "FL-3 maximum [a.u.]"),
    ("fl3_npeaks", "FL-3 number of peaks"),
    ("fl3_pos", "FL-3 position of peak [µs]"),
    ("fl3_width", "FL-3 width [µs]"),
    ("frame", "Video frame number"),
    ("inert_ratio", "Inertia ratio sqrt(m20/m02)"),
    ("inert_ratio_raw", "Raw inertia ratio sqrt(m20/m02)"),
    ("index", "Event index"),
    ("ncells", "Number of cells in image"),
    ("pc1", "Principal component 1"),
    ("pc2", "Principal component 2"),
    ("pos_x", "Position along channel axis [µm]"),
    ("pos_y", "Position lateral in channel [µm]"),
    ("size_x", "Bounding box size x [µm]"),
    ("size_y", "Bounding box size y [µm]"),
    ("time", "Event time [s]"),
    ("volume", "Volume [µm³]"),
];

/// Per-event arrays (contours, images, waveforms)
const NON_SCALAR_FEATURES: &[(&str, &str)] = &[
    ("contour", "Binary event contour image"),
    ("image", "Gray scale event image"),
    ("image_bg", "Gray scale event background image"),
    ("mask", "Binary region labeling the event in the image"),
    (TRACE, "Dictionary of fluorescence traces"),
];

/// Whether `name` is part of the vocabulary
pub fn is_feature(name: &str) -> bool {
    is_scalar(name) || NON_SCALAR_FEATURES.iter().any(|(n, _)| *n == name)
}

/// Whether `name` is a scalar feature
pub fn is_scalar(name: &str) -> bool {
    SCALAR_FEATURES.iter().any(|(n, _)| *n == name)
}

/// Human-readable label of a feature
pub fn feature_label(name: &str) -> Option<&'static str> {
    SCALAR_FEATURES
        .iter()
        .chain(NON_SCALAR_FEATURES)
        .find(|(n, _)| *n == name)
        .map(|(_, label)| *label)
}

/// All feature names, scalar first
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    SCALAR_FEATURES
        .iter()
        .chain(NON_SCALAR_FEATURES)
        .map(|(name, _)| *name)
}

pub fn scalar_feature_names() -> impl Iterator<Item = &'static str> {
    SCALAR_FEATURES.iter().map(|(name, _)| *name)
}
