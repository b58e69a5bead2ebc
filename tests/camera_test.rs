use scene_viewer::{
    camera::{CameraController, CameraMove, CameraState, Projection, in_height_range, in_z_band},
    config::{Profile, ViewerConfig},
};

use crate::common::test_utils::assert_close;

mod common;

fn bounded_at(position: [f32; 3], angle: f32) -> CameraController {
    CameraController::new(CameraState::new(position, angle, 15.0), Profile::Bounded)
}

#[test]
fn should_move_up_inside_a_z_band() {
    let mut camera = bounded_at([0.0, 10.0, 150.0], 0.0);
    assert!(camera.apply(CameraMove::Up));
    assert_close(camera.state().position.y, 25.0);
    assert_close(camera.state().position.z, 150.0);

    assert!(camera.apply(CameraMove::Down));
    assert_close(camera.state().position.y, 10.0);
}

#[test]
fn should_reject_height_above_the_ceiling() {
    let mut camera = bounded_at([0.0, 170.0, 150.0], 0.0);
    let before = *camera.state();
    assert!(!camera.apply(CameraMove::Up));
    assert_eq!(*camera.state(), before);
}

#[test]
fn should_never_change_height_between_the_bands() {
    for angle in [0.0, 60.0, 180.0, 340.0] {
        for z in [50.0, -50.0] {
            let mut camera = bounded_at([0.0, 50.0, z], angle);
            for _ in 0..5 {
                assert!(!camera.apply(CameraMove::Up), "UP moved at angle {angle}, z = {z}");
                assert!(!camera.apply(CameraMove::Down), "DOWN moved at angle {angle}, z = {z}");
            }
            assert_close(camera.state().position.y, 50.0);
        }
    }
}

#[test]
fn should_treat_band_edges_as_inside() {
    for z in [90.0, 240.0, -90.0, -240.0] {
        assert!(in_z_band(z), "{z} should be inside a band");
        let mut camera = bounded_at([0.0, 50.0, z], 0.0);
        assert!(camera.apply(CameraMove::Up), "UP rejected at z = {z}");
    }
    for z in [89.9, 240.1, 0.0, -89.9, -240.1] {
        assert!(!in_z_band(z), "{z} should be outside both bands");
    }
}

#[test]
fn should_treat_height_limits_as_outside() {
    assert!(!in_height_range(4.0));
    assert!(!in_height_range(180.0));
    assert!(in_height_range(4.5));
    assert!(in_height_range(179.5));

    // 19 - 15 lands exactly on the floor.
    let mut camera = bounded_at([0.0, 19.0, 150.0], 0.0);
    assert!(!camera.apply(CameraMove::Down));
    assert_close(camera.state().position.y, 19.0);

    // 165 + 15 lands exactly on the ceiling.
    let mut camera = bounded_at([0.0, 165.0, 150.0], 0.0);
    assert!(!camera.apply(CameraMove::Up));

    let mut camera = bounded_at([0.0, 164.0, 150.0], 0.0);
    assert!(camera.apply(CameraMove::Up));
    assert_close(camera.state().position.y, 179.0);
}

#[test]
fn should_scale_vertical_step_by_heading() {
    let mut camera = bounded_at([0.0, 50.0, 150.0], 60.0);
    assert!(camera.apply(CameraMove::Up));
    assert_close(camera.state().position.y, 57.5);
}

#[test]
fn should_keep_forward_and_back_inside_the_bands() {
    let mut camera = bounded_at([0.0, 50.0, 150.0], 0.0);
    assert!(camera.apply(CameraMove::Forward));
    assert_close(camera.state().position.z, 135.0);
    assert!(camera.apply(CameraMove::Back));
    assert_close(camera.state().position.z, 150.0);

    let mut camera = bounded_at([0.0, 50.0, 105.0], 0.0);
    assert!(camera.apply(CameraMove::Forward));
    assert_close(camera.state().position.z, 90.0);
    assert!(!camera.apply(CameraMove::Forward));
    assert_close(camera.state().position.z, 90.0);

    let mut camera = bounded_at([0.0, 50.0, 230.0], 0.0);
    assert!(!camera.apply(CameraMove::Back));
    assert_close(camera.state().position.z, 230.0);
}

#[test]
fn should_turn_and_step_with_half_the_heading() {
    let mut camera = bounded_at([0.0, 50.0, 150.0], 0.0);
    assert!(camera.apply(CameraMove::Left));
    let half = 7.5f32.to_radians();
    assert_close(camera.state().angle, 15.0);
    assert_close(camera.state().position.x, 15.0 * half.cos());
    assert_close(camera.state().position.z, 150.0 + 15.0 * half.sin());

    let mut camera = bounded_at([0.0, 50.0, 150.0], 30.0);
    assert!(camera.apply(CameraMove::Right));
    assert_close(camera.state().angle, 15.0);
    assert_close(camera.state().position.x, -15.0 * half.cos());
    assert_close(camera.state().position.z, 150.0 - 15.0 * half.sin());
}

#[test]
fn should_move_diagonally_in_the_free_profile() {
    let config = ViewerConfig::free();
    let mut camera = CameraController::from_config(&config);
    let start = camera.state().position;

    assert!(camera.apply(CameraMove::Left));
    assert_close(camera.state().position.x, start.x + 15.0);
    assert_close(camera.state().position.z, start.z + 15.0);

    assert!(camera.apply(CameraMove::Right));
    assert!(camera.apply(CameraMove::Right));
    assert_close(camera.state().position.x, start.x - 15.0);
    assert_close(camera.state().position.y, start.y);
    assert_close(camera.state().position.z, start.z - 15.0);

    for movement in [CameraMove::Up, CameraMove::Down, CameraMove::Forward, CameraMove::Back] {
        assert!(!camera.apply(movement));
    }
    assert_close(camera.state().angle, 0.0);
}

#[test]
fn should_start_at_the_configured_position() {
    let camera = CameraController::from_config(&ViewerConfig::bounded());
    let state = camera.state();
    assert_close(state.position.x, 14.283286);
    assert_close(state.position.y, 35.90461);
    assert_close(state.position.z, 158.73952);
    assert_close(state.angle, 340.0);
    assert_close(state.speed, 15.0);
    assert_eq!(camera.profile(), Profile::Bounded);
}

#[test]
fn should_look_at_the_target() {
    use cgmath::Transform;

    let camera = bounded_at([10.0, 10.0, 100.0], 0.0);
    let view = camera.view_matrix();
    let target = view.transform_point(cgmath::Point3::new(10.0, 10.0, 0.0));
    assert_close(target.x, 0.0);
    assert_close(target.y, 0.0);
    assert_close(target.z, -100.0);
}

#[test]
fn should_map_depth_range_to_zero_one() {
    let projection = Projection::for_config(&ViewerConfig::default());
    assert_close(projection.aspect(), 800.0 / 600.0);
    let m = projection.calc_matrix();

    let near = m * cgmath::Vector4::new(0.0, 0.0, -0.1, 1.0);
    let far = m * cgmath::Vector4::new(0.0, 0.0, -1000.0, 1.0);
    assert_close(near.z / near.w, 0.0);
    assert_close(far.z / far.w, 1.0);
}
