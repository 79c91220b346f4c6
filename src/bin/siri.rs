/// siri - 三线程闭环
///
/// 系统架构:
/// 1. 采集线程: 抓帧 + 检测跟踪 + 目标选择 (固定节拍)
/// 2. 决策线程: 观测 → 相对指针位移 (阻塞在邮箱上)
/// 3. 渲染线程: 标注 + 输出 (固定节拍, 可关闭)
///
/// Ctrl+C 触发退出信号, 三个线程各自在下一个挂起点退出.
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use siri::detection::{
    ByteTracker, DetectAndTrack, ReplayDetector, SyntheticDetector, TrackingDetector,
};
use siri::input::{
    parse_geometry, FixedGeometry, FrameSource, GeometryLookup, ImageFileSource, SyntheticSource,
    WmctrlLookup,
};
use siri::pipeline::{CaptureLoop, Mailbox, Operator, Shutdown, VisualHandle, Visualizer};
use siri::pointer::LogPointer;
use siri::renderer::{build_sink, load_font};
use siri::{AimConfig, Args, SessionError, SessionMonitor, Step};

/// 模拟检测器中的目标数量
const SYNTHETIC_TARGETS: usize = 3;

fn join<T>(handle: JoinHandle<T>) -> Result<T> {
    let name = handle.thread().name().unwrap_or("worker").to_string();
    handle
        .join()
        .map_err(|_| anyhow!("{} thread panicked", name))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let tick = args.tick()?;
    let frame_size = args.frame_size()?;
    let aim = AimConfig::load(&args.aim_config);
    aim.print_summary();

    log::info!("🚀 siri 启动");
    log::info!(
        "⚙️ 节拍 {:.3}s | 置信度 {:.2} | 设备 {} | 推理尺寸 {}x{}",
        tick.as_secs_f64(),
        args.conf,
        args.device,
        frame_size.0,
        frame_size.1
    );

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.trigger()).context("install Ctrl+C handler")?;
    }

    // ========== 外部协作者 ==========
    let lookup: Box<dyn GeometryLookup> = match &args.geometry {
        Some(spec) => {
            let monitor = parse_geometry(spec)
                .ok_or_else(|| SessionError::Config(format!("invalid geometry {:?}", spec)))?;
            Box::new(FixedGeometry(monitor))
        }
        None => {
            log::info!("🔍 查找窗口: {:?}", args.window);
            Box::new(WmctrlLookup::new(args.window.clone()))
        }
    };

    let source: Box<dyn FrameSource> = if args.source == "synthetic" {
        Box::new(SyntheticSource::new())
    } else {
        Box::new(ImageFileSource::open(&args.source)?)
    };
    log::info!("📹 帧来源: {}", args.source);

    let tracker = ByteTracker::new(aim.bytetrack.clone());
    let detector: Box<dyn DetectAndTrack> = match &args.replay {
        Some(path) => Box::new(
            TrackingDetector::new(ReplayDetector::load(path)?, args.conf, frame_size)
                .with_tracker(tracker),
        ),
        None => Box::new(
            TrackingDetector::new(SyntheticDetector::new(SYNTHETIC_TARGETS), args.conf, frame_size)
                .with_tracker(tracker),
        ),
    };

    let sink = build_sink(args.render, &args.out_dir)?;
    let font = match &args.font {
        Some(path) => Some(load_font(path)?),
        None => None,
    };

    // ========== 共享状态 ==========
    let monitor = SessionMonitor::new();
    let mailbox = Arc::new(Mailbox::new());
    let visual = sink.as_ref().map(|_| VisualHandle::new());

    let mut capture = CaptureLoop::new(
        lookup,
        source,
        detector,
        monitor.clone(),
        Arc::clone(&mailbox),
        tick,
        shutdown.clone(),
    )
    .with_selector(aim.selector());

    let mut operator = Operator::new(
        Arc::clone(&mailbox),
        monitor,
        Box::new(LogPointer::new()),
        shutdown.clone(),
    )
    .with_model(aim.motion_model());

    if let Some(visual) = &visual {
        capture = capture.with_visualizer(visual.clone());
        operator = operator.with_visualizer(visual.clone());
    }

    // ========== 启动渲染线程 ==========
    let visualizer_thread = match (sink, visual) {
        (Some(sink), Some(visual)) => {
            let mut visualizer =
                Visualizer::new(visual, sink, tick, shutdown.clone()).with_font(font);
            Some(
                thread::Builder::new()
                    .name("visualizer".into())
                    .spawn(move || visualizer.run())?,
            )
        }
        _ => {
            log::info!("🖼️ 渲染已关闭");
            None
        }
    };

    // ========== 启动决策线程 ==========
    let operator_thread = thread::Builder::new()
        .name("operator".into())
        .spawn(move || operator.run())?;

    // ========== 启动采集线程 ==========
    let capture_thread = {
        let shutdown = shutdown.clone();
        let mailbox = Arc::clone(&mailbox);
        thread::Builder::new().name("capture".into()).spawn(move || {
            let session = capture.run();
            // 会话结束后其余线程随之退出
            shutdown.trigger();
            mailbox.publish(Step::Abort);
            session
        })?
    };

    log::info!("✅ 流水线启动完成, Ctrl+C 退出\n");

    let session = join(capture_thread)?;
    join(operator_thread)?;
    if let Some(handle) = visualizer_thread {
        join(handle)?;
    }

    session?;
    log::info!("👋 已退出");
    Ok(())
}
