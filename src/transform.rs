//! View transform: accumulated rotation, zoom and panning.
//!
//! The rotation is kept as a matrix and updated incrementally; it is never
//! rebuilt from Euler angles. Zoom and pan are stored relative to the display
//! size so that changing the frame definition does not move the model. The
//! per-frame matrix scales them by `frame_scale = frame_width / display_width`.
//!
//! ```text
//!   frame = translate(-center) -> rotation -> scale(z, -z, z) -> translate(w/2 + pan)
//! ```
//!
//! The y flip in the scale maps model space (y up) to screen space (y down).

use crate::aabb::Aabb;
use crate::math::mat3x4::Mat3x4;
use crate::math::vec3::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    rotation: Mat3x4,
    zoom: f32,
    pan: (f32, f32),
    init_rotation: Vec3,
    init_scene_rotation: f32,
    scene_rotation: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl ViewTransform {
    pub fn new(init_rotation: Vec3, init_scene_rotation: f32) -> Self {
        Self {
            rotation: Mat3x4::identity(),
            zoom: 1.0,
            pan: (0.0, 0.0),
            init_rotation,
            init_scene_rotation,
            scene_rotation: 0.0,
        }
    }

    // ============ Accessors ============

    pub fn rotation(&self) -> &Mat3x4 {
        &self.rotation
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Panning offset in display pixels.
    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    /// Accumulated scene rotation about the vertical axis, in `[-180, 180)`.
    pub fn scene_rotation(&self) -> f32 {
        self.scene_rotation
    }

    pub fn init_rotation(&self) -> Vec3 {
        self.init_rotation
    }

    pub fn set_initial(&mut self, init_rotation: Vec3, init_scene_rotation: f32) {
        self.init_rotation = init_rotation;
        self.init_scene_rotation = init_scene_rotation;
    }

    /// Display angles recovered from the rotation matrix.
    pub fn euler_angles(&self) -> Vec3 {
        self.rotation.euler_angles()
    }

    // ============ Updates ============

    /// Applies rotation deltas in degrees about X, then Y, then Z.
    pub fn rotate(&mut self, rx: f32, ry: f32, rz: f32) {
        self.rotation
            .rotate_about_x(rx % 360.0)
            .rotate_about_y(ry % 360.0)
            .rotate_about_z(rz % 360.0);
    }

    /// Spins the scene about its vertical axis while keeping the initial tilt.
    ///
    /// The order of the five rotations matters: undoing X before Z and redoing
    /// them in reverse keeps repeated calls from drifting.
    pub fn rotate_scene(&mut self, degrees: f32) {
        let init = self.init_rotation;
        self.rotation
            .rotate_about_x(-init.x)
            .rotate_about_z(-init.z)
            .rotate_about_y(degrees)
            .rotate_about_z(init.z)
            .rotate_about_x(init.x);

        let mut angle = (self.scene_rotation + degrees) % 360.0;
        if angle >= 180.0 {
            angle -= 360.0;
        } else if angle < -180.0 {
            angle += 360.0;
        }
        self.scene_rotation = angle;
    }

    /// Multiplies the zoom. Non-positive or non-finite factors are ignored.
    pub fn zoom_by(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.zoom *= factor;
        }
    }

    /// Moves the view by a display-pixel offset.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.0 += dx;
        self.pan.1 += dy;
    }

    /// Fits the scene into a `width` x `height` display and restores the
    /// initial rotations.
    pub fn reset(&mut self, aabb: Option<&Aabb>, width: u32, height: u32) {
        let diagonal = aabb.map_or(0.0, Aabb::length_of_diagonal);
        self.zoom = if diagonal > 0.0 && diagonal.is_finite() {
            width.min(height) as f32 / diagonal
        } else {
            1.0
        };
        self.pan = (0.0, 0.0);
        self.rotation.set_identity();
        self.rotate(
            self.init_rotation.x,
            self.init_rotation.y,
            self.init_rotation.z,
        );
        self.scene_rotation = 0.0;
        self.rotate_scene(self.init_scene_rotation);
    }

    // ============ Frame Matrices ============

    /// The model-to-frame matrix for a frame of `frame_width` x
    /// `frame_height` pixels.
    pub fn frame_matrix(
        &self,
        center: Vec3,
        frame_width: u32,
        frame_height: u32,
        frame_scale: f32,
    ) -> Mat3x4 {
        self.build(center, frame_width, frame_height, frame_scale, true)
    }

    /// Like [`Self::frame_matrix`] but without the rotation. Lights and
    /// position-fixed meshes are drawn with it so they stay put on screen.
    pub fn lighting_matrix(
        &self,
        center: Vec3,
        frame_width: u32,
        frame_height: u32,
        frame_scale: f32,
    ) -> Mat3x4 {
        self.build(center, frame_width, frame_height, frame_scale, false)
    }

    fn build(
        &self,
        center: Vec3,
        frame_width: u32,
        frame_height: u32,
        frame_scale: f32,
        rotate: bool,
    ) -> Mat3x4 {
        let z = self.zoom * frame_scale;
        let mut m = Mat3x4::identity();
        m.translate(-center.x, -center.y, -center.z);
        if rotate {
            m.multiply(&self.rotation);
        }
        m.scale(z, -z, z).translate(
            frame_width as f32 / 2.0 + self.pan.0 * frame_scale,
            frame_height as f32 / 2.0 + self.pan.1 * frame_scale,
            0.0,
        );
        m
    }
}
