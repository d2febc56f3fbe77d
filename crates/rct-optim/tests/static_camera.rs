//! Integration test for the static-camera, moving-target problem.

use nalgebra::{Rotation3, Translation3};
use rct_core::synthetic::{planar, poses};
use rct_core::{rotation_angle_between, translation_distance, CameraIntrinsics, Iso3, Pt3, Vec3};
use rct_optim::backend::BackendSolveOptions;
use rct_optim::problems::static_camera::*;
use rct_optim::{optimize, CalibrationError};

fn iso(t: [f64; 3], euler: [f64; 3]) -> Iso3 {
    Iso3::from_parts(
        Translation3::new(t[0], t[1], t[2]),
        Rotation3::from_euler_angles(euler[0], euler[1], euler[2]).into(),
    )
}

struct Scene {
    problem: ExtrinsicStaticCameraMovingTargetProblem,
    base_to_camera: Iso3,
    wrist_to_target: Iso3,
}

fn scene() -> Scene {
    let intr = CameraIntrinsics::new(600.0, 600.0, 320.0, 240.0);
    let base_to_camera = poses::look_at(
        &Pt3::new(1.2, 0.3, 0.9),
        &Pt3::new(0.6, 0.0, 0.3),
        &Vec3::z(),
    );
    let wrist_to_target = iso([0.02, -0.05, 0.12], [0.15, -0.1, 0.05]);
    let board = planar::grid_points_with_relief(6, 5, 0.04, 0.02);

    let base_to_target = [
        iso([0.55, -0.05, 0.30], [0.0, 0.0, 0.0]),
        iso([0.62, 0.04, 0.28], [0.3, -0.1, 0.2]),
        iso([0.58, 0.08, 0.35], [-0.2, 0.25, -0.1]),
        iso([0.65, -0.08, 0.25], [0.1, 0.3, 0.4]),
        iso([0.50, 0.02, 0.32], [-0.3, -0.2, -0.3]),
        iso([0.60, -0.02, 0.38], [0.25, 0.15, -0.35]),
    ];
    let base_to_wrist: Vec<Iso3> = base_to_target
        .iter()
        .map(|target| target * wrist_to_target.inverse())
        .collect();
    let image_observations = base_to_target
        .iter()
        .map(|target| {
            let camera_to_target = base_to_camera.inverse() * target;
            planar::project_set(&intr, &camera_to_target, &board).unwrap()
        })
        .collect();

    let problem = ExtrinsicStaticCameraMovingTargetProblem {
        intr,
        base_to_wrist,
        image_observations,
        base_to_camera_guess: poses::perturb(
            &base_to_camera,
            Vec3::new(0.02, 0.03, -0.02),
            Vec3::new(-0.02, 0.01, 0.015),
        ),
        wrist_to_target_guess: poses::perturb(
            &wrist_to_target,
            Vec3::new(-0.03, 0.01, 0.02),
            Vec3::new(0.01, 0.01, -0.02),
        ),
        options: StaticCameraSolveOptions::default(),
    };

    Scene {
        problem,
        base_to_camera,
        wrist_to_target,
    }
}

#[test]
fn static_camera_recovers_ground_truth() {
    let scene = scene();
    let backend = BackendSolveOptions {
        min_abs_decrease: Some(1e-14),
        min_rel_decrease: Some(1e-14),
        min_error: Some(1e-16),
        ..BackendSolveOptions::default()
    };

    let result = optimize_static_camera(&scene.problem, &backend).unwrap();

    assert!(result.converged);
    assert!(result.final_cost_per_obs <= result.initial_cost_per_obs);
    assert!(result.final_cost_per_obs < 1e-6);
    assert!(rotation_angle_between(&result.base_to_camera, &scene.base_to_camera) < 1e-4);
    assert!(translation_distance(&result.base_to_camera, &scene.base_to_camera) < 1e-4);
    assert!(rotation_angle_between(&result.wrist_to_target, &scene.wrist_to_target) < 1e-4);
    assert!(translation_distance(&result.wrist_to_target, &scene.wrist_to_target) < 1e-4);
}

#[test]
fn generic_optimize_matches_wrapper() {
    let scene = scene();
    let backend = BackendSolveOptions::default();

    let via_trait = optimize(&scene.problem, &backend).unwrap();
    let via_wrapper = optimize_static_camera(&scene.problem, &backend).unwrap();

    assert_eq!(via_trait.converged, via_wrapper.converged);
    assert_eq!(via_trait.initial_cost_per_obs, via_wrapper.initial_cost_per_obs);
}

#[test]
fn empty_image_is_rejected() {
    let mut problem = scene().problem;
    problem.image_observations[2] = Default::default();

    let err = optimize_static_camera(&problem, &BackendSolveOptions::default()).unwrap_err();
    match err {
        CalibrationError::InvalidInput(msg) => assert!(msg.contains("image 2"), "{msg}"),
        other => panic!("unexpected error {other}"),
    }
}
