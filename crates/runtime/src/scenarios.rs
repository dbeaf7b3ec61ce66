use anyhow::{bail, Result};
use imgcompute::dispatch::{Dispatcher, Operand};
use imgcompute::oracle::{compare, Comparison, Mismatch};
use imgcompute::types::SUPPORTED_PIXEL_TYPES;
use imgcompute::{Axis, Hyperstack, Kernel, LogicalImage, PixelType, PlaneIndex};

pub struct Scenario {
    pub name: &'static str,
    pub run: fn(&Dispatcher<'_>) -> Result<()>,
}

pub fn all() -> Vec<Scenario> {
    vec![
        Scenario { name: "add_pixelwise_uint16", run: add_pixelwise_uint16 },
        Scenario { name: "shape_mismatch_is_reported", run: shape_mismatch_is_reported },
        Scenario { name: "max_projection", run: max_projection },
        Scenario { name: "dilate_erode_cube", run: dilate_erode_cube },
        Scenario { name: "device_round_trip", run: device_round_trip },
    ]
}

/// Expects an incremented image to equal its source; always fails.
pub fn injected_mismatch() -> Scenario {
    Scenario { name: "injected_mismatch", run: injected }
}

fn ramp(pixel_type: PixelType, (w, h, d): (usize, usize, usize), step: f64) -> Result<LogicalImage> {
    let mut image = LogicalImage::stack(pixel_type, w, h, d)?;
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                image.set(PlaneIndex::slice(z), x, y, ((x + 3 * y + 7 * z) % 97) as f64 * step);
            }
        }
    }
    Ok(image)
}

/// Stack with `value` at each of `points` on every slice.
fn marked(points: &[(usize, usize, f64)]) -> Result<LogicalImage> {
    let mut image = LogicalImage::stack(PixelType::UnsignedInt16, 100, 100, 5)?;
    for z in 0..5 {
        for &(x, y, value) in points {
            image.set(PlaneIndex::slice(z), x, y, value);
        }
    }
    Ok(image)
}

fn add_pixelwise_uint16(dispatcher: &Dispatcher<'_>) -> Result<()> {
    let a = marked(&[(5, 5, 1.0), (6, 6, 1.0), (7, 7, 1.0)])?;
    let b = marked(&[(7, 5, 2.0), (6, 6, 2.0), (5, 7, 2.0)])?;
    let expected = marked(&[(5, 5, 1.0), (7, 7, 1.0), (7, 5, 2.0), (5, 7, 2.0), (6, 6, 3.0)])?;

    let mut actual = LogicalImage::new(PixelType::UnsignedInt16, a.extents());
    dispatcher.dispatch(Kernel::AddPixelwise, &mut [Operand::Host(&a), Operand::Host(&b), Operand::HostOut(&mut actual)])?;
    compare(&expected, &actual).into_result()?;
    Ok(())
}

fn shape_mismatch_is_reported(_: &Dispatcher<'_>) -> Result<()> {
    let a = LogicalImage::stack(PixelType::UnsignedInt16, 100, 100, 100)?;
    let b = LogicalImage::stack(PixelType::UnsignedInt16, 50, 50, 100)?;
    match compare(&a, &b) {
        Comparison::Mismatch(Mismatch::Shape { axis: Axis::Width, expected: 100, actual: 50 }) => Ok(()),
        other => bail!("expected a width mismatch of 100 != 50, got {other:?}"),
    }
}

fn max_projection(dispatcher: &Dispatcher<'_>) -> Result<()> {
    let src = ramp(PixelType::Float32, (64, 48, 10), 0.5)?;
    let mut expected = LogicalImage::stack(PixelType::Float32, 64, 48, 1)?;
    for y in 0..48 {
        for x in 0..64 {
            let peak = (0..10).map(|z| src.get(PlaneIndex::slice(z), x, y)).fold(f64::MIN, f64::max);
            expected.set(PlaneIndex::slice(0), x, y, peak);
        }
    }

    let ctx = dispatcher.context();
    let mut actual = ctx.create_image(PixelType::Float32, expected.extents())?;
    dispatcher.dispatch(Kernel::MaxProjection, &mut [Operand::Host(&src), Operand::ImageOut(&mut actual)])?;
    compare(&expected, &ctx.pull(&actual)?).into_result()?;
    Ok(())
}

fn dilate_erode_cube(dispatcher: &Dispatcher<'_>) -> Result<()> {
    let mut cube = LogicalImage::stack(PixelType::UnsignedInt8, 9, 9, 9)?;
    for z in 3..6 {
        for y in 3..6 {
            for x in 3..6 {
                cube.set(PlaneIndex::slice(z), x, y, 1.0);
            }
        }
    }
    for (kernel, expected) in [(Kernel::Dilate, 81.0), (Kernel::Erode, 1.0)] {
        let mut out = LogicalImage::new(PixelType::UnsignedInt8, cube.extents());
        dispatcher.dispatch(kernel, &mut [Operand::Host(&cube), Operand::HostOut(&mut out)])?;
        let count = dispatcher.dispatch(Kernel::SumPixels, &mut [Operand::Host(&out)])?.scalar();
        if count != Some(expected) {
            bail!("{} of a 3x3x3 cube has {count:?} foreground pixels, expected {expected}", kernel.name());
        }
    }
    Ok(())
}

fn device_round_trip(dispatcher: &Dispatcher<'_>) -> Result<()> {
    let ctx = dispatcher.context();
    for pixel_type in SUPPORTED_PIXEL_TYPES {
        let host = ramp(pixel_type, (17, 13, 3), 1.0)?;
        let buffer = ctx.push_buffer(&host)?;
        let image = ctx.buffer_to_image(&buffer)?;
        compare(&host, &ctx.pull(&image)?).into_result()?;
    }
    Ok(())
}

fn injected(dispatcher: &Dispatcher<'_>) -> Result<()> {
    let src = ramp(PixelType::SignedInt16, (8, 8, 1), 1.0)?;
    let mut shifted = LogicalImage::new(PixelType::SignedInt16, src.extents());
    dispatcher.dispatch(Kernel::AddScalar, &mut [Operand::Host(&src), Operand::HostOut(&mut shifted), Operand::Scalar(1.0)])?;
    compare(&src, &shifted).into_result()?;
    Ok(())
}
