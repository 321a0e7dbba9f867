mod common;

use invoice_synth::Error;
use invoice_synth::fonts::FontSet;
use invoice_synth::geometry::{BoundingBox, to_pixel_rect};
use invoice_synth::render::{INK, PAPER, blank_surface};
use invoice_synth::table::{CellLayout, HEADER_SETS, TableData, TableState, TableSynthesizer};

fn headers(hs: &[&str]) -> Vec<String> {
    hs.iter().map(|h| h.to_string()).collect()
}

fn row(cells: &[&str]) -> Vec<String> {
    headers(cells)
}

const TABLE_BOX: BoundingBox = BoundingBox {
    x1: 10.0,
    y1: 220.88,
    x2: 560.0,
    y2: 328.88,
};

#[test]
fn headers_come_from_the_header_catalog() {
    let resolver = common::resolver();
    let config = common::config();
    for seed in 0..40 {
        let synth = TableSynthesizer::new(108.0, 550.0, &resolver, &config, common::rng(seed));
        assert_eq!(synth.state(), TableState::HeadersChosen);
        let chosen: Vec<&str> = synth.headers().iter().map(String::as_str).collect();
        assert!(HEADER_SETS.iter().any(|set| *set == chosen.as_slice()), "{chosen:?}");
    }
}

#[test]
fn row_cap_follows_region_height() {
    let resolver = common::resolver();
    let config = common::config();
    let cap = |h: f64| {
        TableSynthesizer::with_headers(headers(&["produit"]), h, 100.0, &resolver, &config, common::rng(0))
            .max_rows()
    };
    assert_eq!(cap(108.0), 5);
    assert_eq!(cap(30.0), 3);
    assert_eq!(cap(0.0), 3);
    assert_eq!(cap(400.0), 20);
}

#[test]
fn generated_rows_fit_region_and_header_count() {
    let resolver = common::resolver();
    let config = common::config();
    let hs = headers(&["produit", "quantité", "prix"]);
    let mut seen = std::collections::BTreeSet::new();
    for seed in 0..300 {
        let mut synth =
            TableSynthesizer::with_headers(hs.clone(), 108.0, 550.0, &resolver, &config, common::rng(seed));
        let data = synth.generate_data();
        assert_eq!(synth.state(), TableState::DataGenerated);

        let body = data.body().len();
        assert!((2..=5).contains(&body), "body rows = {body}");
        seen.insert(body);

        assert!(data.has_header());
        assert_eq!(data.header(), Some(hs.as_slice()));
        for r in data.rows() {
            assert_eq!(r.len(), 3);
        }
        assert_eq!(data.validate().unwrap(), (body + 1, 3));
    }
    // Every allowed count shows up over enough seeds.
    assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
}

#[test]
fn columns_are_sampled_by_category() {
    let resolver = common::resolver();
    let config = common::config();
    let hs = headers(&["qte", "Description", "Remise"]);
    let mut synth = TableSynthesizer::with_headers(hs, 300.0, 550.0, &resolver, &config, common::rng(5));
    let data = synth.generate_data();
    for r in data.body() {
        assert!(["1", "2", "5", "10"].contains(&r[0].as_str()));
        assert!(["Papier A4", "Stylos", "Classeurs", "Webcam HD"].contains(&r[1].as_str()));
        assert_eq!(r[2], "Cell Remise");
    }
}

#[test]
fn ragged_data_is_rejected_before_drawing() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let mut img = blank_surface(600, 900);
    let data = TableData::from_rows(vec![row(&["a", "b", "c"]), row(&["d", "e"])]);
    let synth =
        TableSynthesizer::with_headers(headers(&["x", "y", "z"]), 108.0, 550.0, &resolver, &config, common::rng(1));
    let err = synth
        .render_with_layout(&mut img, &TABLE_BOX, data, &fonts, &CellLayout::plain(&config))
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{err}");
    assert!(common::is_blank(&img));
}

#[test]
fn empty_data_is_rejected() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    for data in [TableData::from_rows(vec![]), TableData::from_rows(vec![vec![]])] {
        let mut img = blank_surface(600, 900);
        let synth =
            TableSynthesizer::with_headers(headers(&["x"]), 108.0, 550.0, &resolver, &config, common::rng(1));
        let err = synth.render(&mut img, &TABLE_BOX, Some(data), &fonts).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err}");
        assert!(common::is_blank(&img));
    }
}

#[test]
fn zero_area_region_is_rejected() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let mut img = blank_surface(600, 900);
    let flat = BoundingBox::new(10.0, 300.0, 560.0, 300.0);
    let synth = TableSynthesizer::new(0.0, 550.0, &resolver, &config, common::rng(2));
    let err = synth.render(&mut img, &flat, None, &fonts).unwrap_err();
    assert!(matches!(err, Error::DegenerateRegion));
}

#[test]
fn grid_is_drawn_inside_the_transformed_region() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let mut img = blank_surface(600, 900);
    let data = TableData::new(
        vec![row(&["produit", "prix"]), row(&["Stylos", "4.50 €"]), row(&["Cahiers", "2.00 €"])],
        true,
    );
    let synth = TableSynthesizer::with_headers(
        headers(&["produit", "prix"]),
        TABLE_BOX.height(),
        TABLE_BOX.width(),
        &resolver,
        &config,
        common::rng(3),
    );
    let drawn = synth
        .render_with_layout(&mut img, &TABLE_BOX, data.clone(), &fonts, &CellLayout::plain(&config))
        .unwrap();
    assert_eq!(drawn, data);

    let rect = to_pixel_rect(&TABLE_BOX, 900.0);
    let (x1, y1) = (rect.x1.round() as u32, rect.y1.round() as u32);
    let (x2, y2) = (rect.x2.round() as u32, rect.y2.round() as u32);
    assert_eq!(*img.get_pixel(x1, y1), INK);
    assert_eq!(*img.get_pixel(x2, y2), INK);
    assert_eq!(*img.get_pixel(x1, (y1 + y2) / 2), INK);

    // Nothing outside the region.
    for (x, y, p) in img.enumerate_pixels() {
        if x < x1 || x > x2 || y < y1 || y > y2 {
            assert_eq!(*p, PAPER, "ink at ({x}, {y})");
        }
    }
}

#[test]
fn text_stays_inside_its_cells() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let mut img = blank_surface(600, 900);
    let data = TableData::from_rows(vec![row(&["A-001", "Webcam HD", "99.90 €"])]);
    let layout = CellLayout {
        border_color: PAPER,
        ..CellLayout::plain(&config)
    };
    let synth =
        TableSynthesizer::with_headers(headers(&["ID", "produit", "prix"]), 108.0, 550.0, &resolver, &config, common::rng(4));
    synth
        .render_with_layout(&mut img, &TABLE_BOX, data, &fonts, &layout)
        .unwrap();

    let rect = to_pixel_rect(&TABLE_BOX, 900.0);
    let inked: Vec<(u32, u32)> = img
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != PAPER)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!inked.is_empty(), "no text drawn");
    for (x, y) in inked {
        assert!(x as f64 >= rect.x1 && x as f64 <= rect.x2, "x={x}");
        assert!(y as f64 >= rect.y1 && y as f64 <= rect.y2, "y={y}");
    }
}

#[test]
fn rendering_fixed_data_is_repeatable() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let data = TableData::new(
        vec![
            row(&["produit", "quantité", "prix"]),
            row(&["Stylos", "2", "4.50 €"]),
            row(&["Classeurs", "10", "12.00 €"]),
        ],
        true,
    );
    let draw = |seed| {
        let mut img = blank_surface(600, 900);
        let synth = TableSynthesizer::with_headers(
            headers(&["produit", "quantité", "prix"]),
            108.0,
            550.0,
            &resolver,
            &config,
            common::rng(seed),
        );
        let out = synth
            .render_with_layout(&mut img, &TABLE_BOX, data.clone(), &fonts, &CellLayout::plain(&config))
            .unwrap();
        (img, out)
    };
    let (a, data_a) = draw(10);
    let (b, data_b) = draw(99);
    assert_eq!(data_a, data_b);
    assert!(a == b, "surfaces differ");
}

#[test]
fn uppercase_headers_leave_body_rows_alone() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let data = TableData::new(
        vec![row(&["produit", "quantité"]), row(&["stylos", "2"])],
        true,
    );
    let layout = CellLayout {
        uppercase_header: true,
        ..CellLayout::plain(&config)
    };
    let mut img = blank_surface(600, 900);
    let synth = TableSynthesizer::with_headers(
        headers(&["produit", "quantité"]),
        108.0,
        550.0,
        &resolver,
        &config,
        common::rng(0),
    );
    let drawn = synth
        .render_with_layout(&mut img, &TABLE_BOX, data, &fonts, &layout)
        .unwrap();
    assert_eq!(drawn.rows()[0], row(&["PRODUIT", "QUANTITÉ"]));
    assert_eq!(drawn.rows()[1], row(&["stylos", "2"]));
}

#[test]
fn uppercase_only_touches_a_real_header_row() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    let data = TableData::from_rows(vec![row(&["stylos", "2"])]);
    let layout = CellLayout {
        uppercase_header: true,
        ..CellLayout::plain(&config)
    };
    let mut img = blank_surface(600, 900);
    let synth =
        TableSynthesizer::with_headers(headers(&["produit", "qte"]), 108.0, 550.0, &resolver, &config, common::rng(0));
    let drawn = synth
        .render_with_layout(&mut img, &TABLE_BOX, data.clone(), &fonts, &layout)
        .unwrap();
    assert_eq!(drawn, data);
}

#[test]
fn generated_render_returns_what_was_drawn() {
    let resolver = common::resolver();
    let config = common::config();
    let fonts = FontSet::fallback();
    for seed in 0..20 {
        let mut img = blank_surface(600, 900);
        let synth = TableSynthesizer::new(
            TABLE_BOX.height(),
            TABLE_BOX.width(),
            &resolver,
            &config,
            common::rng(seed),
        );
        let headers = synth.headers().to_vec();
        let data = synth.render(&mut img, &TABLE_BOX, None, &fonts).unwrap();
        let (rows, cols) = data.validate().unwrap();
        assert_eq!(cols, headers.len());
        assert!((3..=6).contains(&rows));
        let header = data.header().unwrap();
        let lower: Vec<String> = header.iter().map(|h| h.to_lowercase()).collect();
        let expected: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        assert_eq!(lower, expected);
        assert!(!common::is_blank(&img));
    }
}

#[test]
fn table_data_serializes_as_a_matrix() {
    let data = TableData::new(vec![row(&["produit", "prix"]), row(&["Stylos", "4.50 €"])], true);
    assert_eq!(
        serde_json::to_string(&data).unwrap(),
        r#"[["produit","prix"],["Stylos","4.50 €"]]"#
    );
}
