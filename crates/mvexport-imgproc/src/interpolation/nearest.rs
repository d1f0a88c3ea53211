use mvexport_image::Image;

/// Value of the pixel closest to `(u, v)`, clamped into the image.
pub(crate) fn nearest_neighbor_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let x = (u.round().max(0.0) as usize).min(image.cols() - 1);
    let y = (v.round().max(0.0) as usize).min(image.rows() - 1);

    let mut pixel = [0.0; C];
    for (c, p) in pixel.iter_mut().enumerate() {
        *p = image.get([y, x, c]).copied().unwrap_or_default();
    }

    pixel
}
