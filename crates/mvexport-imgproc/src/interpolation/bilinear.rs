use mvexport_image::Image;

fn pixel_at<const C: usize>(data: &[f32], cols: usize, x: usize, y: usize) -> &[f32] {
    let base = (y * cols + x) * C;
    &data[base..base + C]
}

/// Weighted mean of the four pixels around `(u, v)`.
///
/// Coordinates are clamped into the image; the last row and column are
/// replicated past the border.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());
    let (u, v) = (u.max(0.0), v.max(0.0));

    let x0 = (u as usize).min(cols - 1);
    let y0 = (v as usize).min(rows - 1);
    let x1 = (x0 + 1).min(cols - 1);
    let y1 = (y0 + 1).min(rows - 1);

    let (fx, fy) = (u.fract(), v.fract());
    let weights = [
        (1.0 - fx) * (1.0 - fy),
        fx * (1.0 - fy),
        (1.0 - fx) * fy,
        fx * fy,
    ];

    let data = image.as_slice();
    let corners = [
        pixel_at::<C>(data, cols, x0, y0),
        pixel_at::<C>(data, cols, x1, y0),
        pixel_at::<C>(data, cols, x0, y1),
        pixel_at::<C>(data, cols, x1, y1),
    ];

    let mut pixel = [0.0; C];
    for (corner, w) in corners.iter().zip(weights) {
        for (p, &c) in pixel.iter_mut().zip(corner.iter()) {
            *p += c * w;
        }
    }

    pixel
}
