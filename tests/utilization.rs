use synth_herder::extract::utilization::{parse_str, Utilization};

const REPORT: &str = "\
1. CLB Logic
------------

+----------------------------+-------+-------+-----------+-------+
|          Site Type         |  Used | Fixed | Available | Util% |
+----------------------------+-------+-------+-----------+-------+
| CLB LUTs*                  | 35306 |     0 |   1182240 |  2.99 |
|   LUT as Logic             | 32012 |     0 |   1182240 |  2.71 |
| CLB Registers              | 41234 |     0 |   2364480 |  1.74 |
|   Register as Flip Flop    | 41234 |     0 |   2364480 |  1.74 |
+----------------------------+-------+-------+-----------+-------+

2. BLOCKRAM
-----------

+-------------------+------+-------+-----------+-------+
|     Site Type     | Used | Fixed | Available | Util% |
+-------------------+------+-------+-----------+-------+
| Block RAM Tile    |  140 |     0 |      2160 |  6.48 |
+-------------------+------+-------+-----------+-------+

3. ARITHMETIC
-------------

+-----------+------+-------+-----------+-------+
| Site Type | Used | Fixed | Available | Util% |
+-----------+------+-------+-----------+-------+
| DSPs      |   12 |     0 |      6840 |  0.18 |
+-----------+------+-------+-----------+-------+
";

#[test]
fn extracts_all_four_resources() {
    let util = parse_str(REPORT).unwrap();

    let luts = util.luts.unwrap();
    assert_eq!(luts.used, 35306);
    assert_eq!(luts.available, 1182240);
    assert!((luts.util - 2.99).abs() < 1e-9);

    assert_eq!(util.ff.unwrap().used, 41234);
    assert_eq!(util.bram.unwrap().used, 140);
    assert_eq!(util.dsp.unwrap().used, 12);
}

#[test]
fn single_row_report_leaves_other_resources_null() {
    let util = parse_str("CLB LUTs* | 120 | 0.5 | 500 | 24.00 |").unwrap();

    let luts = util.luts.unwrap();
    assert_eq!(luts.used, 120);
    assert_eq!(luts.available, 500);
    assert!((luts.util - 24.00).abs() < 1e-9);

    assert!(util.ff.is_none());
    assert!(util.bram.is_none());
    assert!(util.dsp.is_none());
}

#[test]
fn no_matching_rows_yields_all_keys_null() {
    let util = parse_str("nothing of interest here\n| Some Other Row | 1 | 2 | 3 | 4 |").unwrap();
    assert_eq!(util, Utilization::default());

    let json = serde_json::to_value(&util).unwrap();
    for key in ["LUTS", "FF", "BRAM", "DSP"] {
        assert!(json.get(key).is_some(), "missing key {key}");
        assert!(json[key].is_null());
    }
}

#[test]
fn repeated_rows_keep_the_last_match() {
    let text = "\
| CLB LUTs*                  |   100 |     0 |   1182240 |  0.01 |
| CLB LUTs*                  |   200 |     0 |   1182240 |  0.02 |
";
    let util = parse_str(text).unwrap();
    assert_eq!(util.luts.unwrap().used, 200);
}

#[test]
fn nested_lut_rows_do_not_shadow_the_summary_row() {
    // "LUT as Logic" must not match the "CLB LUTs*" pattern
    let text = "|   LUT as Logic             | 32012 |     0 |   1182240 |  2.71 |";
    let util = parse_str(text).unwrap();
    assert!(util.luts.is_none());
}
