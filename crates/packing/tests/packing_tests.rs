//! Integration tests for lumatile-packing.

use lumatile_core::{SheetMaterial, TileShape, TileSpec, Tiling};
use lumatile_packing::{PackingConfig, PackingStrategy, SheetPacker, SheetQuantity};

fn tiling(shape: TileShape, rows: usize, cols: usize) -> Tiling {
    let spec = TileSpec::new(shape, 0, 10.0, 1.0).unwrap();
    Tiling::full(spec, rows, cols).unwrap()
}

const STRATEGIES: [PackingStrategy; 3] = [
    PackingStrategy::Auto,
    PackingStrategy::Shelf,
    PackingStrategy::Lattice,
];

mod fixed_sheet_tests {
    use super::*;

    #[test]
    fn test_every_shape_and_strategy_is_valid() {
        let sheet = SheetMaterial::new("board", 60.0, 45.0);
        for shape in TileShape::ALL {
            let tiling = tiling(shape, 3, 4);
            for strategy in STRATEGIES {
                let config = PackingConfig::new()
                    .with_strategy(strategy)
                    .with_spacing(0.3)
                    .with_margin(1.0);
                let result = SheetPacker::new(config).pack(&tiling, &sheet).unwrap();
                assert!(
                    result.validate(tiling.len(), 1e-6).is_ok(),
                    "{} with {:?}",
                    shape,
                    strategy
                );
                assert_eq!(result.placed_count(), 12);
                assert!(result.utilization > 0.0 && result.utilization <= 1.0);
            }
        }
    }

    #[test]
    fn test_auto_is_never_worse() {
        let sheet = SheetMaterial::new("board", 50.0, 40.0);
        let tiling = tiling(TileShape::Hexagon, 4, 5);
        let pack = |strategy| {
            SheetPacker::new(PackingConfig::new().with_strategy(strategy))
                .pack(&tiling, &sheet)
                .unwrap()
        };
        let auto = pack(PackingStrategy::Auto);
        let shelf = pack(PackingStrategy::Shelf);
        let lattice = pack(PackingStrategy::Lattice);
        assert!(auto.sheet_count() <= shelf.sheet_count());
        assert!(auto.sheet_count() <= lattice.sheet_count());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let sheet = SheetMaterial::new("board", 40.0, 40.0);
        let tiling = tiling(TileShape::Triangle, 3, 5);
        let a = SheetPacker::default_config().pack(&tiling, &sheet).unwrap();
        let b = SheetPacker::default_config().pack(&tiling, &sheet).unwrap();
        assert_eq!(a.sheets, b.sheets);
    }

    #[test]
    fn test_capacity_matches_first_sheet() {
        let sheet = SheetMaterial::new("board", 25.0, 25.0);
        let tiling = tiling(TileShape::Rectangle, 3, 3);
        let result = SheetPacker::default_config().pack(&tiling, &sheet).unwrap();
        assert_eq!(result.capacity_per_sheet, 4);
        assert_eq!(result.quantity, SheetQuantity::Sheets(3));
        assert_eq!(result.sheets[0].placements.len(), 4);
        assert_eq!(result.sheets[2].placements.len(), 1);
    }
}

mod unbounded_tests {
    use super::*;

    #[test]
    fn test_single_layout_with_length() {
        let sheet = SheetMaterial::unbounded("acrylic roll", 35.0);
        for shape in TileShape::ALL {
            let tiling = tiling(shape, 2, 5);
            let result = SheetPacker::default_config().pack(&tiling, &sheet).unwrap();
            assert_eq!(result.sheet_count(), 1);
            let length = result.required_length.unwrap();
            assert!(length > 0.0);
            assert!(matches!(result.quantity, SheetQuantity::Length(l) if l == length));
            assert!(result.validate(10, 1e-6).is_ok(), "{}", shape);
        }
    }

    #[test]
    fn test_narrow_roll_rejected() {
        let sheet = SheetMaterial::unbounded("ribbon", 4.0);
        let tiling = tiling(TileShape::Hexagon, 1, 2);
        assert!(SheetPacker::default_config().pack(&tiling, &sheet).is_err());
    }
}
