// Runs in its own process so nothing else has touched the global registry.

use imgcompute::converters::{self, ConverterRegistry};
use imgcompute::dispatch::Dispatcher;
use imgcompute::{ComputeError, Context, LogicalImage, PixelType};

#[test]
fn global_registry_lifecycle() {
    let ctx = Context::cpu();
    let host = LogicalImage::stack(PixelType::UnsignedInt8, 4, 4, 1).unwrap();

    assert!(matches!(converters::global(), Err(ComputeError::RegistryNotInitialized)));
    assert!(matches!(Dispatcher::new(ctx.clone()), Err(ComputeError::RegistryNotInitialized)));
    assert!(matches!(
        converters::convert::<LogicalImage, imgcompute::DeviceImage>(&ctx, &host),
        Err(ComputeError::RegistryNotInitialized)
    ));

    converters::initialize(ConverterRegistry::with_builtin().unwrap()).unwrap();
    assert_eq!(converters::global().unwrap().len(), 6);
    assert!(Dispatcher::new(ctx.clone()).is_ok());
    let image: imgcompute::DeviceImage = converters::convert(&ctx, &host).unwrap();
    assert_eq!(ctx.pull(&image).unwrap(), host);

    assert!(matches!(
        converters::initialize(ConverterRegistry::with_builtin().unwrap()),
        Err(ComputeError::RegistryAlreadyInitialized)
    ));
}
