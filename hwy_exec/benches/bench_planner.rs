//! # Planner Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use comms_if::tlm::{ObjectMsg, TelemetryMsg};
use hwy_lib::{
    planner_ctrl::{Params, PlannerCtrl},
    road::{test_util::circle_map, RoadPoint},
};
use util::module::State;

fn planner_benchmark(c: &mut Criterion) {
    // ---- Build the map and the planner ----

    let map = Arc::new(circle_map().unwrap());

    let params: Params =
        util::params::from_str(include_str!("../../params/planner_ctrl.toml")).unwrap();

    let mut planner = PlannerCtrl::new(params, map.clone(), None).unwrap();

    // Ego in the middle lane with a slower car ahead and one alongside on the left
    let ego_s_m = 300.0;
    let ego_pos = map.to_cartesian(&RoadPoint::new(ego_s_m, 6.0));
    let ego_head_rad = map.segment_head_rad(map.closest_waypoint(&ego_pos));

    let object = |id: u64, s_m: f64, d_m: f64| {
        let p = map.to_cartesian(&RoadPoint::new(s_m, d_m));
        ObjectMsg {
            id,
            x: p.x,
            y: p.y,
            vx: 15.0 * ego_head_rad.cos(),
            vy: 15.0 * ego_head_rad.sin(),
            s: s_m,
            d: d_m,
        }
    };

    let tlm = TelemetryMsg {
        x: ego_pos.x,
        y: ego_pos.y,
        s: ego_s_m,
        d: 6.0,
        yaw: ego_head_rad.to_degrees(),
        speed: 20.0,
        previous_path_x: vec![],
        previous_path_y: vec![],
        end_path_s: 0.0,
        end_path_d: 0.0,
        sensor_fusion: vec![
            object(0, ego_s_m + 20.0, 6.0),
            object(1, ego_s_m + 5.0, 2.0),
            object(2, ego_s_m + 80.0, 10.0),
        ],
    };

    // ---- Frame conversions ----

    c.bench_function("RoadMap::to_road_frame", |b| {
        b.iter(|| map.to_road_frame(black_box(&ego_pos), black_box(ego_head_rad)))
    });

    c.bench_function("RoadMap::to_cartesian", |b| {
        b.iter(|| map.to_cartesian(black_box(&RoadPoint::new(ego_s_m, 6.0))))
    });

    // ---- Full cycle ----

    c.bench_function("PlannerCtrl::proc", |b| {
        b.iter(|| planner.proc(black_box(&tlm)).unwrap())
    });
}

criterion_group!(benches, planner_benchmark);
criterion_main!(benches);
