use anyhow::{anyhow, Context};
use log::info;
use trackscan::{
    find_nearest_foreground,
    util::{classify_snapped, grid_to_image, skeletonize_image},
    JunctionClassifier, PipelineConfig, Point,
};

const USAGE: &str = "usage: trackscan <image> [--config <config.json>] [--path <path.json>] \
                     [--out <skeleton.png>] [--nearest <x>,<y>]";

#[derive(Debug, Default)]
struct Args {
    image: String,
    config: Option<String>,
    path: Option<String>,
    out: Option<String>,
    nearest: Option<Point>,
}

fn parse_point(s: &str) -> Result<Point, anyhow::Error> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("expected <x>,<y>, got {}", s))?;
    Ok(Point::new(x.trim().parse()?, y.trim().parse()?))
}

fn flag_value(
    iter: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<String, anyhow::Error> {
    iter.next()
        .ok_or_else(|| anyhow!("missing value for {}", flag))
}

fn parse_args() -> Result<Args, anyhow::Error> {
    let mut args = Args::default();
    let mut image = None;
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(flag_value(&mut iter, &arg)?),
            "--path" => args.path = Some(flag_value(&mut iter, &arg)?),
            "--out" => args.out = Some(flag_value(&mut iter, &arg)?),
            "--nearest" => args.nearest = Some(parse_point(&flag_value(&mut iter, &arg)?)?),
            "-h" | "--help" => return Err(anyhow!(USAGE)),
            _ if image.is_none() => image = Some(arg.clone()),
            _ => return Err(anyhow!("unexpected argument {}\n{}", arg, USAGE)),
        }
    }

    args.image = image.ok_or_else(|| anyhow!(USAGE))?;
    Ok(args)
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => PipelineConfig::default(),
    };

    let img = image::open(&args.image)?;
    let skeleton = skeletonize_image(&img, &config)?;
    info!(
        "skeleton of {} has {} pixels",
        args.image,
        skeleton.count_foreground()
    );

    println!("{}", skeleton);

    if let Some(out) = &args.out {
        grid_to_image(&skeleton).save(out)?;
        info!("wrote skeleton to {}", out);
    }

    if let Some(origin) = args.nearest {
        let nearest = find_nearest_foreground(&skeleton, origin)?;
        println!("nearest skeleton pixel to {}: {}", origin, nearest);
    }

    if let Some(path_file) = &args.path {
        let json = std::fs::read_to_string(path_file)?;
        let raw: Vec<(i32, i32)> = serde_json::from_str(&json)?;

        // the planner works on the unthinned maze, points are moved onto the skeleton
        let points: Vec<Point> = raw.into_iter().map(Point::from).collect();
        let classifier = JunctionClassifier::new(config.signatures.clone());
        let tokens = classify_snapped(&classifier, &skeleton, &points)?;
        if tokens.is_empty() {
            info!("path has {} points, too short for junctions", points.len());
        }
        println!("{}", tokens);
    }

    Ok(())
}
