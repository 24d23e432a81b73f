use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use vramsim_views::inference::QuickInferenceSim;
use vramsim_views::pipeline::{PipelinePhase, PipelineSim};
use vramsim_views::showcase::{group_thousands, AsicShowcase, TpuShowcase};
use vramsim_views::training::TrainingSim;

use super::float_fmt::fmt_f64_fixed;

const BG: &str = "#0a0a0f";
const GRID: &str = "#1a1a2e";
const GRID_STEP: f64 = 40.0;

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, String> {
    canvas
        .get_context("2d")
        .map_err(|_| "canvas: get_context threw".to_string())?
        .ok_or("canvas: missing 2d context".to_string())?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| "canvas: context is not 2d".to_string())
}

fn draw_grid_background(ctx: &CanvasRenderingContext2d, w: f64, h: f64) {
    ctx.set_fill_style_str(BG);
    ctx.fill_rect(0.0, 0.0, w, h);

    ctx.set_stroke_style_str(GRID);
    ctx.set_line_width(1.0);
    let mut x = 0.0;
    while x < w {
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
        ctx.stroke();
        x += GRID_STEP;
    }
    let mut y = 0.0;
    while y < h {
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(w, y);
        ctx.stroke();
        y += GRID_STEP;
    }
}

fn rounded_rect(
    ctx: &CanvasRenderingContext2d,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    r: f64,
) -> Result<(), String> {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.arc_to(x + w, y, x + w, y + h, r)
        .and_then(|_| ctx.arc_to(x + w, y + h, x, y + h, r))
        .and_then(|_| ctx.arc_to(x, y + h, x, y, r))
        .and_then(|_| ctx.arc_to(x, y, x + w, y, r))
        .map_err(|_| "canvas: arc_to threw".to_string())?;
    ctx.close_path();
    Ok(())
}

fn text(ctx: &CanvasRenderingContext2d, s: &str, x: f64, y: f64) -> Result<(), String> {
    ctx.fill_text(s, x, y)
        .map_err(|_| "canvas: fill_text threw".to_string())
}

fn dot(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64) -> Result<(), String> {
    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, TAU)
        .map_err(|_| "canvas: arc threw".to_string())?;
    ctx.fill();
    Ok(())
}

/// Grid plus a single labelled GPU box.
pub fn draw_quick_inference(
    canvas: &HtmlCanvasElement,
    sim: &QuickInferenceSim,
) -> Result<(), String> {
    let ctx = context_2d(canvas)?;
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let cx = w / 2.0;
    let cy = h / 2.0;

    draw_grid_background(&ctx, w, h);

    ctx.set_fill_style_str(sim.phase().color());
    rounded_rect(&ctx, cx - 60.0, cy - 60.0, 120.0, 120.0, 12.0)?;
    ctx.fill();

    ctx.set_fill_style_str("#fff");
    ctx.set_text_align("center");
    ctx.set_font("bold 14px sans-serif");
    text(&ctx, "GPU", cx, cy - 20.0)?;
    ctx.set_font("10px sans-serif");
    text(&ctx, &sim.gpu().name, cx, cy + 5.0)?;
    let mut vram = fmt_f64_fixed(sim.gpu().vram_gb, 0);
    vram.push_str("GB");
    text(&ctx, &vram, cx, cy + 20.0)?;
    Ok(())
}

/// Data source, GPU and model boxes; a loss sparkline once steps exist.
pub fn draw_training<R: vramsim::prng::RandomSource>(
    canvas: &HtmlCanvasElement,
    sim: &TrainingSim<R>,
) -> Result<(), String> {
    let ctx = context_2d(canvas)?;
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let cy = h / 2.0;
    let left_x = 100.0;
    let right_x = w - 180.0;
    let gpu_x = w / 2.0;

    draw_grid_background(&ctx, w, h);

    ctx.set_fill_style_str("#3b82f6");
    rounded_rect(&ctx, left_x, cy - 40.0, 80.0, 80.0, 8.0)?;
    ctx.fill();
    ctx.set_fill_style_str("#fff");
    ctx.set_font("12px sans-serif");
    ctx.set_text_align("center");
    text(&ctx, "Data", left_x + 40.0, cy + 5.0)?;

    let gpu_color = if sim.phase().is_running() {
        "#10b981"
    } else {
        "#6366f1"
    };
    ctx.set_fill_style_str(gpu_color);
    rounded_rect(&ctx, gpu_x - 50.0, cy - 50.0, 100.0, 100.0, 12.0)?;
    ctx.fill();
    ctx.set_fill_style_str("#fff");
    text(&ctx, "GPU", gpu_x, cy - 15.0)?;
    ctx.set_font("10px sans-serif");
    text(&ctx, &sim.gpu().name, gpu_x, cy + 5.0)?;

    ctx.set_fill_style_str("#f59e0b");
    rounded_rect(&ctx, right_x, cy - 40.0, 80.0, 80.0, 8.0)?;
    ctx.fill();
    ctx.set_fill_style_str("#fff");
    ctx.set_font("12px sans-serif");
    text(&ctx, "Model", right_x + 40.0, cy + 5.0)?;

    // Batches flowing data -> gpu -> model while stepping.
    if sim.phase().is_running() {
        let progress = (sim.step() % 20) as f64 / 20.0;
        ctx.set_fill_style_str("#60a5fa");
        let from = left_x + 80.0;
        let to = gpu_x - 50.0;
        dot(&ctx, from + (to - from) * progress, cy, 4.0)?;
        let from = gpu_x + 50.0;
        dot(&ctx, from + (right_x - from) * progress, cy, 4.0)?;
    }

    let history = sim.loss_history();
    if history.len() >= 2 {
        draw_sparkline(&ctx, history, 20.0, h - 70.0, w - 40.0, 50.0, "#fb7185")?;
    }
    Ok(())
}

fn draw_sparkline(
    ctx: &CanvasRenderingContext2d,
    data: &[f32],
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    color: &str,
) -> Result<(), String> {
    let (min_val, max_val) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = (max_val - min_val).max(0.001);
    let step_x = w / (data.len().saturating_sub(1).max(1) as f64);

    ctx.set_stroke_style_str(color);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    for (i, &val) in data.iter().enumerate() {
        let norm = ((val - min_val) / range).clamp(0.0, 1.0) as f64;
        let px = x + i as f64 * step_x;
        let py = y + h - norm * h;
        if i == 0 {
            ctx.move_to(px, py);
        } else {
            ctx.line_to(px, py);
        }
    }
    ctx.stroke();

    ctx.set_fill_style_str("#64748b");
    ctx.set_font("9px monospace");
    ctx.set_text_align("left");
    text(ctx, "LOSS", x, y - 4.0)
}

/// KV-cache / SRAM block matrix. Shows the newest `rows` of `data_rows`.
#[allow(clippy::too_many_arguments)]
fn draw_blocks(
    ctx: &CanvasRenderingContext2d,
    x: f64,
    y: f64,
    rows: u64,
    cols: u64,
    size: f64,
    data_rows: u64,
    label: &str,
    active: bool,
) -> Result<(), String> {
    ctx.set_fill_style_str("#64748b");
    ctx.set_font("bold 8px monospace");
    ctx.set_text_align("left");
    text(ctx, label, x, y - 8.0)?;

    let view_start = data_rows.saturating_sub(rows);
    for r in 0..rows {
        let row = r + view_start;
        let fill = if active && data_rows > 0 && row == data_rows - 1 {
            "#3b82f6"
        } else if row < data_rows {
            "rgba(148, 163, 184, 0.6)"
        } else {
            "rgba(51, 65, 85, 0.3)"
        };
        ctx.set_fill_style_str(fill);
        for c in 0..cols {
            ctx.fill_rect(
                x + c as f64 * size,
                y + r as f64 * size,
                size - 1.0,
                size - 1.0,
            );
        }
    }
    Ok(())
}

/// Full pipeline scene: HBM and core panels, bus lanes, packets, labels.
pub fn draw_pipeline<R: vramsim::prng::RandomSource>(
    canvas: &HtmlCanvasElement,
    sim: &PipelineSim<R>,
) -> Result<(), String> {
    let ctx = context_2d(canvas)?;
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let phase = sim.phase();

    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_fill_style_str("#0f172a");
    ctx.fill_rect(0.0, 0.0, w, h);

    ctx.set_stroke_style_str("#334155");
    ctx.set_line_width(1.0);
    ctx.stroke_rect(35.0, 45.0, 140.0, 215.0);
    ctx.stroke_rect(w - 175.0, 45.0, 140.0, 215.0);
    ctx.set_fill_style_str("rgba(30, 41, 59, 0.5)");
    ctx.fill_rect(35.0, 45.0, 140.0, 215.0);
    ctx.fill_rect(w - 175.0, 45.0, 140.0, 215.0);

    draw_blocks(
        &ctx,
        45.0,
        60.0,
        25,
        16,
        8.0,
        sim.kv_rows(),
        "HBM_KV_CACHE",
        phase == PipelinePhase::Decode,
    )?;
    let busy = phase.is_running();
    draw_blocks(
        &ctx,
        w - 165.0,
        100.0,
        15,
        15,
        8.0,
        if busy { 15 } else { 0 },
        "SRAM_L1_L2",
        busy,
    )?;

    let (left, right) = sim.particles().rails();
    ctx.set_stroke_style_str("#1e293b");
    for &y in sim.particles().bus_lanes() {
        ctx.begin_path();
        ctx.move_to(left, y);
        ctx.line_to(right, y);
        ctx.stroke();
    }

    if phase == PipelinePhase::Prefill {
        let scan_y = 50.0 + sim.prefill_progress() * 200.0;
        ctx.set_stroke_style_str("#3b82f6");
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.move_to(w - 170.0, scan_y);
        ctx.line_to(w - 40.0, scan_y);
        ctx.stroke();
        ctx.set_line_width(1.0);
    }

    for p in sim.particles().particles() {
        ctx.set_fill_style_str(p.color);
        dot(&ctx, p.pos.x, p.pos.y, p.size)?;
    }

    ctx.set_fill_style_str("#64748b");
    ctx.set_font("bold 9px monospace");
    ctx.set_text_align("center");
    text(&ctx, "HOST PCIe Gen5", w - 100.0, 8.0)?;
    text(&ctx, "HBM STORAGE", 100.0, 280.0)?;
    text(&ctx, "NVLINK BUS", w / 2.0, 280.0)?;
    text(&ctx, "GPU CORES", w - 100.0, 280.0)?;

    ctx.set_fill_style_str("rgba(2, 6, 23, 0.8)");
    ctx.fill_rect(180.0, 220.0, 140.0, 45.0);
    ctx.set_stroke_style_str("#1e293b");
    ctx.stroke_rect(180.0, 220.0, 140.0, 45.0);
    ctx.set_text_align("left");
    ctx.set_font("8px monospace");
    ctx.set_fill_style_str("#3b82f6");
    ctx.fill_rect(185.0, 230.0, 8.0, 8.0);
    ctx.set_fill_style_str("#64748b");
    text(&ctx, "= ACTIVE OPS", 198.0, 237.0)?;
    ctx.set_fill_style_str("rgba(148, 163, 184, 0.6)");
    ctx.fill_rect(185.0, 245.0, 8.0, 8.0);
    ctx.set_fill_style_str("#64748b");
    text(&ctx, "= STORED DATA", 198.0, 252.0)?;
    Ok(())
}

/// Glowing chip card shared by the TPU and ASIC tabs.
struct ChipCard<'a> {
    color: &'a str,
    vendor: &'a str,
    name: &'a str,
    subtitle: String,
    headline: String,
    headline_color: &'a str,
    caption: &'a str,
}

fn draw_chip_card(canvas: &HtmlCanvasElement, card: &ChipCard<'_>) -> Result<(), String> {
    let ctx = context_2d(canvas)?;
    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let cx = w / 2.0;
    let cy = h / 2.0;

    draw_grid_background(&ctx, w, h);

    ctx.set_fill_style_str(card.color);
    ctx.set_shadow_color(card.color);
    ctx.set_shadow_blur(25.0);
    rounded_rect(&ctx, cx - 80.0, cy - 80.0, 160.0, 160.0, 16.0)?;
    ctx.fill();
    ctx.set_shadow_blur(0.0);

    ctx.set_fill_style_str("#fff");
    ctx.set_text_align("center");
    ctx.set_font("bold 18px sans-serif");
    text(&ctx, card.vendor, cx, cy - 30.0)?;
    ctx.set_font("14px sans-serif");
    text(&ctx, card.name, cx, cy + 5.0)?;
    ctx.set_font("12px sans-serif");
    text(&ctx, &card.subtitle, cx, cy + 25.0)?;
    ctx.set_fill_style_str(card.headline_color);
    ctx.set_font("bold 20px sans-serif");
    text(&ctx, &card.headline, cx, cy + 60.0)?;
    ctx.set_font("10px sans-serif");
    text(&ctx, card.caption, cx, cy + 75.0)?;
    Ok(())
}

pub fn draw_tpu(canvas: &HtmlCanvasElement, tpu: &TpuShowcase) -> Result<(), String> {
    let (tops, hbm, _) = tpu.headline();
    let mut subtitle = fmt_f64_fixed(tops, 0);
    subtitle.push_str(" TOPS");
    let mut headline = fmt_f64_fixed(hbm, 0);
    headline.push_str("GB");
    draw_chip_card(
        canvas,
        &ChipCard {
            color: "#4285f4",
            vendor: "GOOGLE",
            name: &tpu.selected().name,
            subtitle,
            headline,
            headline_color: "#34a853",
            caption: "HBM",
        },
    )
}

pub fn draw_asic(canvas: &HtmlCanvasElement, asic: &AsicShowcase) -> Result<(), String> {
    let chip = asic.selected();
    draw_chip_card(
        canvas,
        &ChipCard {
            color: "#10b981",
            vendor: "TAALAS",
            name: &chip.name,
            subtitle: chip.model.clone(),
            headline: group_thousands(chip.tokens_per_sec as u64),
            headline_color: "#fff",
            caption: "tokens/sec",
        },
    )
}
