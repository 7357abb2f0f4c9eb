//! 보정 전후 비교 산점도를 PNG로 그린다.
//! 왼쪽: gsw (원본 vs 보정), 오른쪽: 챔버 W (입구 기준 vs 보정).
//! 회색 점 = 1:1 기준, 검은 점 = 보정값, 빨간 선 = 회귀 직선.

use std::path::Path;

use image::{Rgb, RgbImage};
use thiserror::Error;

use crate::report::regression::{linear_fit, LinearFit};
use crate::report::ComparisonSeries;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("이미지 저장 오류: {0}")]
    Image(#[from] image::ImageError),
    #[error("그릴 수렴 데이터가 없습니다")]
    NoData,
}

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GREY: Rgb<u8> = Rgb([170, 170, 170]);
const GRID: Rgb<u8> = Rgb([228, 228, 228]);
const RED: Rgb<u8> = Rgb([210, 30, 30]);

#[derive(Debug, Clone, Copy)]
struct Panel {
    x0: i64,
    y0: i64,
    size: i64,
    lo: f64,
    hi: f64,
}

impl Panel {
    /// 데이터 좌표를 픽셀 좌표로 바꾼다. 두 축은 같은 범위를 쓴다(1:1 비율).
    fn to_px(&self, x: f64, y: f64) -> (i64, i64) {
        let span = self.hi - self.lo;
        let px = self.x0 + ((x - self.lo) / span * self.size as f64).round() as i64;
        let py = self.y0 + self.size - ((y - self.lo) / span * self.size as f64).round() as i64;
        (px, py)
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn dot(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = from.0 as f64 + t * (to.0 - from.0) as f64;
        let y = from.1 as f64 + t * (to.1 - from.1) as f64;
        put(img, x.round() as i64, y.round() as i64, color);
    }
}

fn axis_range(points: &[(f64, f64)]) -> (f64, f64) {
    let (lo, hi) = points
        .iter()
        .flat_map(|&(x, y)| [x, y])
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let pad = ((hi - lo) * 0.05).max(hi.abs() * 1e-3).max(1e-9);
    (lo - pad, hi + pad)
}

fn draw_panel(img: &mut RgbImage, panel: Panel, points: &[(f64, f64)], fit: Option<LinearFit>) {
    for k in 1..4 {
        let offset = panel.size * k / 4;
        line(
            img,
            (panel.x0 + offset, panel.y0),
            (panel.x0 + offset, panel.y0 + panel.size),
            GRID,
        );
        line(
            img,
            (panel.x0, panel.y0 + offset),
            (panel.x0 + panel.size, panel.y0 + offset),
            GRID,
        );
    }

    for &(x, _) in points {
        let (px, py) = panel.to_px(x, x);
        dot(img, px, py, 3, GREY);
    }
    for &(x, y) in points {
        let (px, py) = panel.to_px(x, y);
        dot(img, px, py, 3, BLACK);
    }

    if let Some(fit) = fit {
        let xs = points.iter().map(|p| p.0).filter(|v| v.is_finite());
        let (xmin, xmax) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), v| {
            (a.min(v), b.max(v))
        });
        let from = panel.to_px(xmin, fit.predict(xmin));
        let to = panel.to_px(xmax, fit.predict(xmax));
        line(img, from, to, RED);
    }

    let (x0, y0, x1, y1) = (panel.x0, panel.y0, panel.x0 + panel.size, panel.y0 + panel.size);
    line(img, (x0, y0), (x1, y0), BLACK);
    line(img, (x1, y0), (x1, y1), BLACK);
    line(img, (x1, y1), (x0, y1), BLACK);
    line(img, (x0, y1), (x0, y0), BLACK);
}

/// 두 패널짜리 비교 그래프를 그린다.
pub fn render_comparison(series: &ComparisonSeries, width: u32, height: u32) -> Result<RgbImage, PlotError> {
    if series.is_empty() {
        return Err(PlotError::NoData);
    }
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    let margin = 40_i64;
    let size = ((width as i64 - 3 * margin) / 2)
        .min(height as i64 - 2 * margin)
        .max(10);

    for (i, points) in [&series.gsw, &series.w_chamber].into_iter().enumerate() {
        let (lo, hi) = axis_range(points);
        let panel = Panel {
            x0: margin + i as i64 * (size + margin),
            y0: margin,
            size,
            lo,
            hi,
        };
        draw_panel(&mut img, panel, points, linear_fit(points));
    }
    Ok(img)
}

/// 비교 그래프를 PNG 파일로 저장한다.
pub fn render_comparison_png(
    series: &ComparisonSeries,
    path: &Path,
    (width, height): (u32, u32),
) -> Result<(), PlotError> {
    let img = render_comparison(series, width, height)?;
    img.save(path)?;
    log::info!("comparison plot written to {}", path.display());
    Ok(())
}
