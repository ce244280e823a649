use std::sync::Arc;
use std::thread;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use zxspec::choice::ColourChoice;
use zxspec::colour;
use zxspec::dither::{DitherStrategy, ErrorDiffusionKernel};
use zxspec::pipeline::{self, ResultImageKind};
use zxspec::preprocess::Scaling;
use zxspec::scr::{self, BITMAP_SIZE, GIGASCREEN_SCR_SIZE, SCR_SIZE};
use zxspec::tap::{self, DATA_FLAG, HEADER_FLAG, TapFile};
use zxspec::{GigaScreenCache, Options};

fn random_image(seed: u64, width: u32, height: u32) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.random(), rng.random(), rng.random()]))
}

fn gigascreen_options() -> Options {
    Options {
        colour_mode: ColourChoice::GigaScreen,
        ..Options::default()
    }
}

#[test]
fn solid_red_without_dithering() {
    let source = RgbImage::from_pixel(256, 192, Rgb([0xFF, 0x00, 0x00]));
    let options = Options {
        dither: DitherStrategy::ErrorDiffusion(ErrorDiffusionKernel::NoDither),
        ..Options::default()
    };

    let results = pipeline::convert(&source, &options, &GigaScreenCache::default()).unwrap();
    let data = scr::convert(&results, &options);

    assert_eq!(data.len(), SCR_SIZE);
    assert!(data[..BITMAP_SIZE].iter().all(|&byte| byte == 0));
    assert!(data[BITMAP_SIZE..].iter().all(|&byte| byte == (2 | 2 << 3 | 0x40)));
}

#[test]
fn black_through_floyd_steinberg() {
    let source = RgbImage::from_pixel(256, 192, Rgb([0, 0, 0]));
    let options = Options {
        dither: DitherStrategy::ErrorDiffusion(ErrorDiffusionKernel::FloydSteinberg),
        ..Options::default()
    };

    let results = pipeline::convert(&source, &options, &GigaScreenCache::default()).unwrap();

    assert_eq!(scr::convert(&results, &options), vec![0; SCR_SIZE]);
}

#[test]
fn random_frames_keep_two_colours_per_block() {
    let cache = GigaScreenCache::default();

    for (seed, dither) in DitherStrategy::all().enumerate() {
        let options = Options {
            dither,
            serpentine: seed % 2 == 0,
            constrained_error_diffusion: seed % 3 == 0,
            ..Options::default()
        };
        let results = pipeline::convert(&random_image(seed as u64, 64, 48), &options, &cache).unwrap();
        let image = pipeline::final_image(&results).unwrap();

        for (x, y) in colour::whole_blocks(image.width(), image.height()) {
            let pixels = colour::block_pixels(image, x, y);
            assert!(colour::tally(&pixels).len() <= 2, "{dither} block ({x}, {y})");
        }
    }
}

#[test]
fn full_screen_scr_size() {
    let options = Options::default();
    let results = pipeline::process_frame(&random_image(1, 320, 200), &options, &GigaScreenCache::default()).unwrap();

    assert_eq!(scr::convert(&results, &options).len(), SCR_SIZE);
}

#[test]
fn gigascreen_scr_holds_two_screens() {
    let options = gigascreen_options();
    let results = pipeline::convert(&random_image(2, 16, 16), &options, &GigaScreenCache::default()).unwrap();

    assert_eq!(pipeline::supporting_images(&results).count(), 2);

    let data = scr::convert(&results, &options);
    assert_eq!(data.len(), GIGASCREEN_SCR_SIZE);

    // half bright family: neither screen sets bright
    let first = scr::scr1(&data);
    let second = scr::scr2(&data).unwrap();
    assert!(first[BITMAP_SIZE..].iter().all(|&byte| byte & 0x40 == 0));
    assert!(second[BITMAP_SIZE..].iter().all(|&byte| byte & 0x40 == 0));
}

#[test]
fn interlaced_gigascreen_pairs_rows() {
    // Alternate black and white lines average to a single grey per block.
    let source = RgbImage::from_fn(256, 384, |_, y| if y % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
    let options = Options {
        scaling: Scaling::Interlaced,
        ..gigascreen_options()
    };
    assert_eq!(options.validate(), Ok(()));

    let results = pipeline::process_frame(&source, &options, &GigaScreenCache::default()).unwrap();

    assert_eq!(pipeline::final_image(&results).unwrap().dimensions(), (256, 192));

    let screens: Vec<_> = pipeline::supporting_images(&results).collect();
    assert_eq!(screens.len(), 2);

    for screen in screens {
        assert_eq!(screen.dimensions(), (256, 192));

        for (x, y) in colour::whole_blocks(screen.width(), screen.height()) {
            assert!(colour::tally(&colour::block_pixels(screen, x, y)).len() <= 2, "block ({x}, {y})");
        }
    }

    assert_eq!(scr::convert(&results, &options).len(), GIGASCREEN_SCR_SIZE);
}

#[test]
fn tape_blocks_verify() {
    let options = Options::default();
    let cache = GigaScreenCache::default();
    let mut parts = Vec::new();

    for seed in 0..3 {
        let results = pipeline::convert(&random_image(seed, 256, 192), &options, &cache).unwrap();
        parts.extend(tap::create_tap_parts(&scr::convert(&results, &options), "frame").unwrap());
    }

    let data = tap::create_tap(&[], &parts);
    let file = TapFile::parse(&data).unwrap();

    assert_eq!(file.blocks.len(), 6);

    for pair in file.blocks.chunks(2) {
        assert_eq!(pair[0].flag, HEADER_FLAG);
        assert_eq!(&pair[0].data[1..11], b"frame     ");
        assert_eq!(pair[1].flag, DATA_FLAG);
        assert_eq!(pair[1].data.len(), SCR_SIZE);
    }

    let mut offset = 0;
    while offset < data.len() {
        let length = usize::from(u16::from_le_bytes([data[offset], data[offset + 1]]));
        let block = &data[offset + 2..offset + 2 + length];
        assert_eq!(tap::checksum(block), 0);
        offset += 2 + length;
    }
}

#[test]
fn frames_share_a_cache_across_threads() {
    let cache = Arc::new(GigaScreenCache::default());
    let options = Arc::new(gigascreen_options());
    let source = Arc::new(random_image(3, 16, 8));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let options = Arc::clone(&options);
            let source = Arc::clone(&source);
            thread::spawn(move || pipeline::convert(&source, &options, &cache).unwrap())
        })
        .collect();

    let outputs: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    for output in &outputs[1..] {
        assert_eq!(output, &outputs[0]);
    }

    assert_eq!(outputs[0][0].kind, ResultImageKind::Final);
    assert_eq!(cache.len(), 1);
}
