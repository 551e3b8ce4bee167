//! Integration tests for lumatile-assembly.

use approx::assert_relative_eq;
use lumatile_assembly::{optimize, Amount, AssemblyOption, BillQuantity, BomBuilder, Selection};
use lumatile_core::{AssemblyGroup, LedStripMaterial, MaterialCatalog, SheetMaterial, TileShape, TileSpec, Tiling};
use lumatile_packing::SheetPacker;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Cheapest discrete covering by exhaustive enumeration.
fn brute_force(demand: f64, options: &[(f64, f64)]) -> f64 {
    fn walk(i: usize, covered: f64, cost: f64, demand: f64, options: &[(f64, f64)], best: &mut f64) {
        if i == options.len() {
            if covered >= demand - 1e-9 && cost < *best {
                *best = cost;
            }
            return;
        }
        let (capacity, unit_cost) = options[i];
        let max = (demand / capacity).ceil() as usize;
        for k in 0..=max {
            walk(i + 1, covered + k as f64 * capacity, cost + k as f64 * unit_cost, demand, options, best);
        }
    }
    let mut best = f64::INFINITY;
    walk(0, 0.0, 0.0, demand, options, &mut best);
    best
}

fn covered(selection: &Selection) -> f64 {
    selection.items.iter().map(|i| i.covered).sum()
}

mod optimizer_tests {
    use super::*;

    #[test]
    fn test_matches_brute_force_on_random_catalogs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let n = rng.gen_range(1..=3);
            let raw: Vec<(f64, f64)> = (0..n)
                .map(|_| (rng.gen_range(1..=6) as f64, rng.gen_range(1..=30) as f64))
                .collect();
            let demand = rng.gen_range(0..=20) as f64 + rng.gen_range(0.0..1.0);
            let options: Vec<_> = raw
                .iter()
                .enumerate()
                .map(|(i, &(capacity, cost))| AssemblyOption::discrete(format!("m{}", i), capacity, cost))
                .collect();

            let selection = optimize("g", demand, &options).unwrap();
            assert!(covered(&selection) >= demand - 1e-9);
            assert_relative_eq!(selection.total_cost, brute_force(demand, &raw), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_continuous_never_costs_more_than_discrete_alone() {
        let discrete = vec![AssemblyOption::discrete("panel", 4.0, 9.0)];
        let mut mixed = discrete.clone();
        mixed.push(AssemblyOption::continuous("roll", 0.5, 3.0));
        for demand in [1.0, 3.5, 4.0, 9.0, 13.0] {
            let a = optimize("g", demand, &discrete).unwrap();
            let b = optimize("g", demand, &mixed).unwrap();
            assert!(b.total_cost <= a.total_cost + 1e-9);
            assert!(covered(&b) >= demand - 1e-9);
        }
    }
}

mod sheet_group_tests {
    use super::*;

    #[test]
    fn test_hexagon_sheets_cheapest_covering() {
        let spec = TileSpec::new(TileShape::Hexagon, 0, 0.05, 0.0).unwrap();
        let tiling = Tiling::full(spec, 3, 6).unwrap();
        assert_eq!(tiling.len(), 18);

        let catalog = MaterialCatalog::new()
            .with_sheet(SheetMaterial::new("30x40", 0.3, 0.4).with_cost(10.0))
            .with_sheet(SheetMaterial::new("40x50", 0.4, 0.5).with_cost(15.0));
        let packings = SheetPacker::default_config().pack_catalog(&tiling, &catalog).unwrap();
        assert_eq!(packings.len(), 2);

        let raw: Vec<(f64, f64)> = ["30x40", "40x50"]
            .iter()
            .map(|name| {
                let packing = packings.iter().find(|p| p.material == *name).unwrap();
                (packing.capacity_per_sheet as f64, catalog.sheet(name).unwrap().unit_cost())
            })
            .collect();

        let mut builder = BomBuilder::new(&catalog);
        let selection = builder
            .add_sheet_group(0, &AssemblyGroup::new("sheets", ["30x40", "40x50"]), &packings, 18)
            .unwrap()
            .unwrap();
        assert!(selection.capacity >= 18.0);
        assert_relative_eq!(selection.total_cost, brute_force(18.0, &raw), epsilon = 1e-9);

        let bom = builder.build();
        assert_relative_eq!(bom.total_cost, selection.total_cost, epsilon = 1e-9);
    }

    #[test]
    fn test_unbounded_stock_bought_by_length() {
        let spec = TileSpec::new(TileShape::Rectangle, 0, 0.1, 0.0).unwrap();
        let tiling = Tiling::full(spec, 2, 3).unwrap();
        let catalog = MaterialCatalog::new().with_sheet(SheetMaterial::unbounded("acrylic roll", 0.35).with_cost(8.0));
        let packings = SheetPacker::default_config().pack_catalog(&tiling, &catalog).unwrap();
        let length = packings[0].required_length.unwrap();

        let mut builder = BomBuilder::new(&catalog);
        let selection = builder
            .add_sheet_group(0, &AssemblyGroup::new("roll", ["acrylic roll"]), &packings, tiling.len())
            .unwrap()
            .unwrap();
        assert!(matches!(selection.items[0].amount, Amount::Quantity(q) if (q - length).abs() < 1e-9));
        assert_relative_eq!(selection.total_cost, 8.0 * length, epsilon = 1e-9);

        let bom = builder.build();
        match bom.items[0].quantity {
            Some(BillQuantity::Length(l)) => assert!((l - length).abs() <= 5e-4),
            ref other => panic!("expected a length, got {:?}", other),
        }
    }
}

mod led_group_tests {
    use super::*;

    #[test]
    fn test_short_demand_picks_single_long_strip() {
        // 0.6 m perimeter hexagons at 30 LEDs/m: 18 LEDs per tile.
        let spec = TileSpec::new(TileShape::Hexagon, 0, 0.1, 0.0).unwrap();
        let tiling = Tiling::new(spec, 3, 3, [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1), (2, 2)]).unwrap();
        let catalog = MaterialCatalog::new()
            .with_led_strip(LedStripMaterial::new("1m", 30, 30.0).with_cost(10.0))
            .with_led_strip(LedStripMaterial::new("5m", 150, 30.0).with_cost(20.0));

        let mut builder = BomBuilder::new(&catalog);
        let demand = builder
            .add_led_group(0, &AssemblyGroup::new("leds", ["1m", "5m"]), &tiling)
            .unwrap()
            .unwrap();
        assert_eq!(demand.leds_per_tile, 18);
        assert_relative_eq!(demand.required_length, 4.2, epsilon = 1e-9);

        let bom = builder.build();
        let items: Vec<_> = bom.items_in("leds-0").collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "5m");
        assert_relative_eq!(bom.total_cost, 20.0);
    }

    #[test]
    fn test_tiny_tiles_record_failure() {
        let spec = TileSpec::new(TileShape::Triangle, 0, 0.001, 0.0).unwrap();
        let tiling = Tiling::full(spec, 1, 2).unwrap();
        let catalog = MaterialCatalog::new().with_led_strip(LedStripMaterial::new("sparse", 10, 10.0).with_cost(1.0));

        let mut builder = BomBuilder::new(&catalog);
        let demand = builder
            .add_led_group(0, &AssemblyGroup::new("leds", ["sparse"]), &tiling)
            .unwrap();
        assert!(demand.is_none());
        let bom = builder.build();
        assert!(!bom.is_complete());
        assert_eq!(bom.failures[0].category, "leds-0");
    }
}

#[cfg(feature = "serde")]
mod serde_tests {
    use super::*;

    #[test]
    fn test_selection_json() {
        let options = vec![AssemblyOption::discrete("5m", 5.0, 20.0)];
        let selection = optimize("leds", 4.2, &options).unwrap();
        let json = serde_json::to_string(&selection).unwrap();
        let back: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selection);
    }
}
