use fixed_mandelbrot::{
    decoder::{decode_records, DecodedPixel},
    escape_time::escape_time,
    pixel::{ITERATIONS_MASK, RECORD_LEN},
    pool::Builder,
    stream::{Beat, BeatQueue, ByteQueue, ByteSource},
    Device, FixedPoint, ViewCommand,
};
use fnv::FnvHashSet;

fn device(engines: usize, interleave: usize) -> Device {
    Device::new(
        Builder::new()
            .with_engines(engines)
            .with_interleave(interleave)
            .create()
            .unwrap(),
    )
}

fn worked_example() -> ViewCommand {
    ViewCommand {
        pixels_x: 4,
        pixels_y: 4,
        max_iterations: 63,
        corner_x: FixedPoint::from_ratio(-3, 2),
        corner_y: FixedPoint::ZERO,
        step: FixedPoint::from_ratio(1, 4),
    }
}

fn expected(view: &ViewCommand, pixel: &DecodedPixel) -> DecodedPixel {
    let (cx, cy) = view.point(pixel.pixel_x, pixel.pixel_y);
    let completion = escape_time(cx, cy, view.max_iterations);
    DecodedPixel {
        pixel_x: pixel.pixel_x,
        pixel_y: pixel.pixel_y,
        iterations_low: completion.iterations as u8 & ITERATIONS_MASK,
        maxed: completion.maxed,
    }
}

fn run(device: &mut Device, commands: Vec<u8>) -> Vec<Beat> {
    let mut input = ByteQueue::from(commands);
    let mut output = BeatQueue::unbounded();
    device.run_until_idle(&mut input, &mut output);
    output.drain()
}

#[test]
fn worked_example_matches_reference() {
    let view = worked_example();
    let bytes = device(2, 3).render(&view);
    let pixels = decode_records(&bytes).unwrap();

    assert_eq!(pixels.len(), 16);
    for pixel in &pixels {
        assert!(pixel.iterations_low <= 63);
        assert_eq!(*pixel, expected(&view, pixel));
    }
}

#[test]
fn every_pixel_reported_exactly_once() {
    let view = ViewCommand {
        pixels_x: 7,
        pixels_y: 5,
        max_iterations: 40,
        corner_x: FixedPoint::from_int(-2),
        corner_y: FixedPoint::from_ratio(-5, 4),
        step: FixedPoint::from_ratio(1, 3),
    };
    let pixels = decode_records(&device(3, 3).render(&view)).unwrap();

    let seen: FnvHashSet<(u16, u16)> = pixels
        .iter()
        .map(|pixel| (pixel.pixel_x, pixel.pixel_y))
        .collect();
    assert_eq!(pixels.len(), 35);
    assert_eq!(seen.len(), 35);
    for pixel_y in 0..5 {
        for pixel_x in 0..7 {
            assert!(seen.contains(&(pixel_x, pixel_y)));
        }
    }
}

#[test]
fn repeated_command_repeats_the_stream() {
    let view = worked_example();
    let mut commands = view.encode();
    commands.extend(view.encode());

    let beats = run(&mut device(2, 3), commands);
    assert_eq!(beats.len(), 2 * 16 * RECORD_LEN);
    let (first, second) = beats.split_at(16 * RECORD_LEN);
    assert_eq!(first, second);

    let fresh = run(&mut device(2, 3), view.encode());
    assert_eq!(fresh, first);
}

#[test]
fn each_sweep_is_one_frame() {
    let view = worked_example();
    let mut commands = view.encode();
    commands.extend(view.encode());
    let beats = run(&mut device(1, 3), commands);

    for frame in beats.chunks(16 * RECORD_LEN) {
        assert!(frame[0].first);
        assert!(frame[frame.len() - 1].last);
        assert_eq!(frame.iter().filter(|beat| beat.first).count(), 1);
        assert_eq!(frame.iter().filter(|beat| beat.last).count(), 1);
    }
}

#[test]
fn recovers_after_a_malformed_command() {
    let view = worked_example();
    let mut commands = view.encode();
    let last = commands.len() - 1;
    commands[last] = 0x5A;
    commands.extend(view.encode());

    let mut device = device(2, 3);
    let beats = run(&mut device, commands);
    assert_eq!(device.parser().malformed(), 1);
    assert_eq!(device.completed_sweeps(), 1);

    let payload: Vec<u8> = beats.iter().map(|beat| beat.payload).collect();
    assert_eq!(decode_records(&payload).unwrap().len(), 16);
}

#[test]
fn slow_consumer_sees_the_same_stream() {
    let view = worked_example();
    let mut unthrottled = decode_records(&device(2, 3).render(&view)).unwrap();

    let mut device = device(2, 3);
    let mut input = ByteQueue::from(view.encode());
    let mut output = BeatQueue::bounded(2);
    let mut payload = Vec::new();
    for tick in 0..100_000u32 {
        device.tick(&mut input, &mut output);
        if tick % 3 == 0 {
            payload.extend(output.pop().map(|beat| beat.payload));
        }
        if device.is_idle() && input.peek().is_none() && output.is_empty() {
            break;
        }
    }

    // Stalls can change which ready slot is collected first, never what is reported.
    let mut throttled = decode_records(&payload).unwrap();
    throttled.sort_by_key(|pixel| (pixel.pixel_y, pixel.pixel_x));
    unthrottled.sort_by_key(|pixel| (pixel.pixel_y, pixel.pixel_x));
    assert_eq!(throttled, unthrottled);
}

#[test]
fn interleave_does_not_change_results() {
    let view = worked_example();
    let mut sequential = decode_records(&device(1, 1).render(&view)).unwrap();
    let mut interleaved = decode_records(&device(4, 3).render(&view)).unwrap();
    sequential.sort_by_key(|pixel| (pixel.pixel_y, pixel.pixel_x));
    interleaved.sort_by_key(|pixel| (pixel.pixel_y, pixel.pixel_x));
    assert_eq!(sequential, interleaved);
}

#[test]
fn parallel_pool_matches_serial_pool() {
    let view = worked_example();
    let serial = device(4, 3).render(&view);
    let mut parallel = Device::new(
        Builder::new()
            .with_engines(4)
            .with_interleave(3)
            .with_parallel(true)
            .create()
            .unwrap(),
    );
    assert_eq!(parallel.render(&view), serial);
}
